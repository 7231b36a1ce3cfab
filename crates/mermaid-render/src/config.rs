use crate::prompt::PromptInterrupt;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const SOURCE_EXTENSION: &str = "mmd";
pub const OUTPUT_EXTENSION: &str = "svg";
pub const RENDER_DIR_NAME: &str = "render";

pub const LOCAL_TOOL: &str = "mmdc";
pub const PACKAGE_RUNNER: &str = "npx";
pub const RUNNER_PACKAGE: &str = "@mermaid-js/mermaid-cli";

pub const SCRATCH_PAGE: &str = "temp_render.html";
pub const SCRATCH_SAVE_PAGE: &str = "temp_render_save.html";
pub const MERMAID_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid/dist/mermaid.min.js";

/// Built-in Mermaid themes accepted by `mmdc -t` and `mermaid.initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Default,
    #[default]
    Neutral,
    Dark,
    Forest,
    Base,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Neutral => "neutral",
            Theme::Dark => "dark",
            Theme::Forest => "forest",
            Theme::Base => "base",
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "neutral" => Ok(Self::Neutral),
            "dark" => Ok(Self::Dark),
            "forest" => Ok(Self::Forest),
            "base" => Ok(Self::Base),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed settings for one run. Nothing here is read from the environment or a file.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Directory scanned in batch mode; scratch pages are written here.
    pub base_dir: PathBuf,
    pub render_dir: PathBuf,
    pub theme: Theme,
    pub local_tool: String,
    pub package_runner: String,
    pub runner_package: String,
    /// Launch the default browser for the browser-assisted fallback.
    pub open_browser: bool,
    /// Ask on the console for pasted base64 SVG data after the browser fallback.
    pub prompt_operator: bool,
    /// Cancels a pending operator prompt when triggered.
    pub interrupt: PromptInterrupt,
}

impl RenderConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let render_dir = base_dir.join(RENDER_DIR_NAME);
        Self {
            base_dir,
            render_dir,
            theme: Theme::default(),
            local_tool: LOCAL_TOOL.to_string(),
            package_runner: PACKAGE_RUNNER.to_string(),
            runner_package: RUNNER_PACKAGE.to_string(),
            open_browser: true,
            prompt_operator: true,
            interrupt: PromptInterrupt::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn with_prompt_operator(mut self, prompt_operator: bool) -> Self {
        self.prompt_operator = prompt_operator;
        self
    }

    pub fn with_interrupt(mut self, interrupt: PromptInterrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn scratch_page(&self) -> PathBuf {
        self.base_dir.join(SCRATCH_PAGE)
    }

    pub fn scratch_save_page(&self) -> PathBuf {
        self.base_dir.join(SCRATCH_SAVE_PAGE)
    }
}
