mod page;

pub use page::BrowserPage;

use crate::config::{RenderConfig, Theme};
use crate::error::{Error, Result};
use crate::prompt::{ConsolePrompt, PasteOutcome, PasteSource, looks_like_svg};
use crate::source::DiagramSource;
use crate::strategy::{RenderAttempt, RenderStrategy};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Last resort: write a scratch page that renders the diagram client-side, open it, and let the
/// operator export the SVG by hand or paste it back as base64.
pub struct BrowserFallback {
    theme: Theme,
    page_path: PathBuf,
    save_page_path: PathBuf,
    open_browser: bool,
    operator: Option<Box<dyn PasteSource>>,
}

impl BrowserFallback {
    pub fn new(page_path: PathBuf, save_page_path: PathBuf, theme: Theme) -> Self {
        Self {
            theme,
            page_path,
            save_page_path,
            open_browser: true,
            operator: None,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        let mut fallback = Self::new(config.scratch_page(), config.scratch_save_page(), config.theme)
            .with_open_browser(config.open_browser);
        if config.prompt_operator {
            fallback = fallback.with_operator(
                ConsolePrompt::stdin().with_interrupt(config.interrupt.clone()),
            );
        }
        fallback
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn with_operator(mut self, operator: impl PasteSource + 'static) -> Self {
        self.operator = Some(Box::new(operator));
        self
    }

    fn write_pages(&self, page: &BrowserPage) -> Result<()> {
        write_file(&self.page_path, page.render_html.as_bytes())?;
        write_file(&self.save_page_path, page.save_handler_html.as_bytes())?;
        tracing::debug!(
            page = %self.page_path.display(),
            save_handler = %self.save_page_path.display(),
            "wrote scratch pages"
        );
        Ok(())
    }

    fn launch(&self) {
        let target = fs::canonicalize(&self.page_path).unwrap_or_else(|_| self.page_path.clone());
        match open::that(&target) {
            // Give the browser a moment before the console prompt competes for attention.
            Ok(()) => std::thread::sleep(Duration::from_secs(1)),
            Err(err) => {
                tracing::warn!(page = %target.display(), %err, "failed to launch browser");
                println!(
                    "❌ Could not open a browser ({err}). Open {} manually.",
                    target.display()
                );
            }
        }
    }

    fn prepare(&self, source: &DiagramSource) -> Result<()> {
        let text = fs::read_to_string(&source.input).map_err(|err| Error::ReadSource {
            path: source.input.clone(),
            source: err,
        })?;
        let page = BrowserPage::build(source, &text, self.theme);
        self.write_pages(&page)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

impl RenderStrategy for BrowserFallback {
    fn name(&self) -> &str {
        "browser"
    }

    fn render(&mut self, source: &DiagramSource) -> RenderAttempt {
        println!("Falling back to browser-based rendering");
        if let Err(err) = self.prepare(source) {
            return RenderAttempt::failed(format!("❌ Error with browser rendering: {err}"));
        }
        if self.open_browser {
            self.launch();
        }

        println!(
            "\nBrowser-based rendering initiated for {}",
            source.input.display()
        );
        println!("Page: {}", self.page_path.display());
        println!("Please use one of the buttons to save the SVG.");
        println!("1. 'Download SVG' - Standard browser download");
        println!("2. 'Save SVG to File' - Alternative method");
        println!("3. 'Copy SVG as Base64' - Paste it back here");
        println!("Output will be saved to: {}", source.output.display());

        let Some(operator) = self.operator.as_mut() else {
            return RenderAttempt::failed("Please complete the save using the browser.");
        };

        match operator.request_paste() {
            PasteOutcome::Decoded(bytes) => {
                if !looks_like_svg(&bytes) {
                    tracing::warn!(
                        output = %source.output.display(),
                        "pasted data does not look like SVG; writing it anyway"
                    );
                }
                match write_file(&source.output, &bytes) {
                    Ok(()) => RenderAttempt::succeeded(format!(
                        "✅ SVG saved to {}",
                        source.output.display()
                    )),
                    Err(err) => {
                        RenderAttempt::failed(format!("❌ Error with browser rendering: {err}"))
                    }
                }
            }
            PasteOutcome::Invalid(err) => {
                RenderAttempt::failed(format!("❌ Error decoding base64 data: {err}"))
            }
            PasteOutcome::Empty => RenderAttempt::failed("❌ No base64 data provided."),
            PasteOutcome::Declined => {
                RenderAttempt::failed("Please complete the save using the browser.")
            }
            PasteOutcome::Cancelled => RenderAttempt::failed("\nOperation canceled by user."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::decode_paste;
    use base64::Engine as _;

    struct Canned(Option<String>);

    impl PasteSource for Canned {
        fn request_paste(&mut self) -> PasteOutcome {
            match self.0.take() {
                Some(data) => decode_paste(&data),
                None => PasteOutcome::Declined,
            }
        }
    }

    fn setup(dir: &Path) -> (DiagramSource, BrowserFallback) {
        let input = dir.join("flow.mmd");
        fs::write(&input, "graph TD\n  A --> B").expect("write source");
        let render_dir = dir.join("render");
        fs::create_dir(&render_dir).expect("mkdir");
        let source = DiagramSource::new(&input, &render_dir);
        let fallback = BrowserFallback::new(
            dir.join("temp_render.html"),
            dir.join("temp_render_save.html"),
            Theme::Neutral,
        )
        .with_open_browser(false);
        (source, fallback)
    }

    #[test]
    fn always_writes_both_scratch_pages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (source, mut fallback) = setup(tmp.path());

        let attempt = fallback.render(&source);
        assert!(!attempt.success);
        assert!(tmp.path().join("temp_render.html").is_file());
        assert!(tmp.path().join("temp_render_save.html").is_file());
        assert!(!source.output.exists());

        let html = fs::read_to_string(tmp.path().join("temp_render.html")).expect("read");
        assert!(html.contains("A --&gt; B"));
    }

    #[test]
    fn pasted_base64_is_written_to_output() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (source, fallback) = setup(tmp.path());
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";
        let encoded = base64::engine::general_purpose::STANDARD.encode(svg);
        let mut fallback = fallback.with_operator(Canned(Some(encoded)));

        let attempt = fallback.render(&source);
        assert!(attempt.success, "{}", attempt.status);
        assert_eq!(fs::read_to_string(&source.output).expect("read"), svg);
    }

    #[test]
    fn invalid_paste_is_reported_and_writes_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (source, fallback) = setup(tmp.path());
        let mut fallback = fallback.with_operator(Canned(Some("%%%".to_string())));

        let attempt = fallback.render(&source);
        assert!(!attempt.success);
        assert!(attempt.status.starts_with("❌ Error decoding base64 data"));
        assert!(!source.output.exists());
    }

    #[test]
    fn unreadable_source_fails_without_panicking() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = DiagramSource::new(tmp.path().join("gone.mmd"), tmp.path());
        let mut fallback = BrowserFallback::new(
            tmp.path().join("temp_render.html"),
            tmp.path().join("temp_render_save.html"),
            Theme::Neutral,
        )
        .with_open_browser(false);

        let attempt = fallback.render(&source);
        assert!(!attempt.success);
        assert!(attempt.status.contains("gone.mmd"));
    }
}
