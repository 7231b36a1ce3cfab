use crate::browser::BrowserFallback;
use crate::config::{RenderConfig, Theme};
use crate::error::ToolError;
use crate::source::DiagramSource;
use crate::tool::ToolCommand;

/// Outcome of one strategy for one file. Printed, counted, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttempt {
    pub success: bool,
    pub status: String,
}

impl RenderAttempt {
    pub fn succeeded(status: impl Into<String>) -> Self {
        Self {
            success: true,
            status: status.into(),
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Available,
    Unavailable(String),
}

/// One way of turning a diagram source into an SVG file.
pub trait RenderStrategy {
    fn name(&self) -> &str;

    fn detect(&mut self) -> Detection {
        Detection::Available
    }

    fn render(&mut self, source: &DiagramSource) -> RenderAttempt;
}

fn describe_tool_failure(err: &ToolError) -> String {
    let mut out = match err {
        ToolError::Exit { status, .. } => format!("❌ Command failed with {status}"),
        ToolError::MissingOutput { output, .. } => {
            format!("❌ Failed to create output file: {}", output.display())
        }
        ToolError::Spawn { program, .. } if err.is_not_found() => {
            format!("❌ Error: `{program}` not found in PATH")
        }
        ToolError::Spawn { .. } | ToolError::StaleOutput { .. } => format!("❌ Error: {err}"),
    };
    if let Some(stderr) = err.stderr() {
        out.push_str("\nError output: ");
        out.push_str(stderr);
    }
    out
}

/// The locally installed `mmdc`. Probed once per run.
pub struct LocalCli {
    tool: ToolCommand,
    theme: Theme,
    invocable: Option<bool>,
}

impl LocalCli {
    pub fn new(tool: ToolCommand, theme: Theme) -> Self {
        Self {
            tool,
            theme,
            invocable: None,
        }
    }
}

impl RenderStrategy for LocalCli {
    fn name(&self) -> &str {
        "mermaid-cli"
    }

    fn detect(&mut self) -> Detection {
        let first_probe = self.invocable.is_none();
        let invocable = *self
            .invocable
            .get_or_insert_with(|| self.tool.is_invocable());
        if invocable {
            println!("Using mermaid-cli ({}) for rendering", self.tool.program());
            return Detection::Available;
        }
        if !first_probe {
            return Detection::Unavailable("mermaid-cli not found".to_string());
        }
        println!(
            "Mermaid CLI ({}) is not installed or not in PATH.",
            self.tool.program()
        );
        println!("Try installing it globally:");
        println!("  npm install -g @mermaid-js/mermaid-cli");
        println!("Alternatively, npx can run it without installing.");
        Detection::Unavailable("mermaid-cli not found".to_string())
    }

    fn render(&mut self, source: &DiagramSource) -> RenderAttempt {
        match self.tool.render(&source.input, &source.output, self.theme) {
            Ok(()) => RenderAttempt::succeeded(format!(
                "✅ Successfully rendered: {}",
                source.output.display()
            )),
            Err(err) => RenderAttempt::failed(describe_tool_failure(&err)),
        }
    }
}

/// `npx @mermaid-js/mermaid-cli`, fetched on demand. Never pre-detected: the attempt itself is
/// the probe.
pub struct PackageRunner {
    tool: ToolCommand,
    theme: Theme,
}

impl PackageRunner {
    pub fn new(tool: ToolCommand, theme: Theme) -> Self {
        Self { tool, theme }
    }
}

impl RenderStrategy for PackageRunner {
    fn name(&self) -> &str {
        self.tool.program()
    }

    fn render(&mut self, source: &DiagramSource) -> RenderAttempt {
        println!("Trying to render with {}...", self.tool.display_name());
        match self.tool.render(&source.input, &source.output, self.theme) {
            Ok(()) => RenderAttempt::succeeded(format!(
                "✅ Successfully rendered with {}: {}",
                self.tool.program(),
                source.output.display()
            )),
            Err(err) => RenderAttempt::failed(describe_tool_failure(&err)),
        }
    }
}

/// Ordered strategies, tried until one leaves an SVG behind.
#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn RenderStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// `mmdc`, then `npx @mermaid-js/mermaid-cli`, then the browser-assisted export.
    pub fn standard(config: &RenderConfig) -> Self {
        let local = ToolCommand::new(config.local_tool.clone());
        let runner = ToolCommand::new(config.package_runner.clone())
            .with_leading_arg(config.runner_package.clone());
        Self::new()
            .with(LocalCli::new(local, config.theme))
            .with(PackageRunner::new(runner, config.theme))
            .with(BrowserFallback::from_config(config))
    }

    pub fn with(mut self, strategy: impl RenderStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain for one file. Every failure is reported and falls through.
    pub fn run(&mut self, source: &DiagramSource) -> bool {
        let count = self.strategies.len();
        for (idx, strategy) in self.strategies.iter_mut().enumerate() {
            let has_next = idx + 1 < count;
            if let Detection::Unavailable(reason) = strategy.detect() {
                tracing::debug!(strategy = strategy.name(), %reason, "strategy unavailable");
                if has_next {
                    println!("{reason}, trying alternative methods");
                } else {
                    println!("{reason}");
                }
                continue;
            }

            let attempt = strategy.render(source);
            println!("{}", attempt.status);
            if attempt.success {
                tracing::debug!(
                    strategy = strategy.name(),
                    output = %source.output.display(),
                    "rendered"
                );
                return true;
            }
            if has_next {
                println!("{} failed, trying alternative methods", strategy.name());
            }
        }
        println!("❌ Could not render {}", source.input.display());
        false
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn scripted(name: &'static str, available: bool, succeeds: bool, log: &CallLog) -> Scripted {
        Scripted {
            name,
            available,
            succeeds,
            log: log.clone(),
        }
    }

    #[test]
    fn stops_at_first_success() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = CallLog::default();
        let mut chain = StrategyChain::new()
            .with(scripted("local", true, true, &log))
            .with(scripted("runner", true, true, &log));
        let source = DiagramSource::new(tmp.path().join("a.mmd"), tmp.path());

        assert!(chain.run(&source));
        assert_eq!(*log.borrow(), vec!["local:detect", "local:render"]);
    }

    #[test]
    fn unavailable_strategy_is_skipped_without_render() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = CallLog::default();
        let mut chain = StrategyChain::new()
            .with(scripted("local", false, true, &log))
            .with(scripted("runner", true, true, &log));
        let source = DiagramSource::new(tmp.path().join("a.mmd"), tmp.path());

        assert!(chain.run(&source));
        assert_eq!(
            *log.borrow(),
            vec!["local:detect", "runner:detect", "runner:render"]
        );
    }

    #[test]
    fn failures_fall_through_to_the_end() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = CallLog::default();
        let mut chain = StrategyChain::new()
            .with(scripted("local", true, false, &log))
            .with(scripted("runner", true, false, &log))
            .with(scripted("browser", true, false, &log));
        let source = DiagramSource::new(tmp.path().join("a.mmd"), tmp.path());

        assert!(!chain.run(&source));
        assert_eq!(
            *log.borrow(),
            vec![
                "local:detect",
                "local:render",
                "runner:detect",
                "runner:render",
                "browser:detect",
                "browser:render",
            ]
        );
    }

    #[test]
    fn standard_chain_order() {
        let cfg = RenderConfig::new(".").with_prompt_operator(false);
        let chain = StrategyChain::standard(&cfg);
        assert_eq!(chain.names(), vec!["mermaid-cli", "npx", "browser"]);
    }

    #[test]
    fn tool_failure_text_includes_stderr() {
        let err = ToolError::Exit {
            program: "mmdc".to_string(),
            code: Some(1),
            status: "exit code 1".to_string(),
            stderr: "Parse error on line 2\n".to_string(),
        };
        assert_eq!(
            describe_tool_failure(&err),
            "❌ Command failed with exit code 1\nError output: Parse error on line 2"
        );
    }

    #[test]
    fn missing_program_is_named() {
        let err = ToolError::Spawn {
            program: "npx @mermaid-js/mermaid-cli".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            describe_tool_failure(&err),
            "❌ Error: `npx @mermaid-js/mermaid-cli` not found in PATH"
        );
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;
        use crate::tool::test_support::{FAILS, WRITES_OUTPUT, write_script};

        #[test]
        fn local_tool_failure_falls_through_to_package_runner() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let mmdc = write_script(tmp.path(), "mmdc", FAILS);
            let npx = write_script(tmp.path(), "npx", WRITES_OUTPUT);
            let input = tmp.path().join("flow.mmd");
            std::fs::write(&input, "graph TD\nA-->B").expect("write source");
            let source = DiagramSource::new(&input, tmp.path());

            let log = CallLog::default();
            let mut chain = StrategyChain::new()
                .with(LocalCli::new(
                    ToolCommand::new(mmdc.to_string_lossy()),
                    Theme::Neutral,
                ))
                .with(PackageRunner::new(
                    ToolCommand::new(npx.to_string_lossy())
                        .with_leading_arg("@mermaid-js/mermaid-cli"),
                    Theme::Neutral,
                ))
                .with(scripted("browser", true, false, &log));

            assert!(chain.run(&source));
            assert!(source.output.is_file());
            assert!(log.borrow().is_empty(), "browser must not be reached");
        }

        #[test]
        fn local_tool_is_probed_once() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let probes = tmp.path().join("probes.log");
            let script = format!(
                "#!/bin/sh\necho \"$1\" >> '{}'\nexit 0\n",
                probes.to_string_lossy()
            );
            let mmdc = write_script(tmp.path(), "mmdc", &script);

            let mut local = LocalCli::new(ToolCommand::new(mmdc.to_string_lossy()), Theme::Neutral);
            assert_eq!(local.detect(), Detection::Available);
            assert_eq!(local.detect(), Detection::Available);

            let log = std::fs::read_to_string(&probes).expect("read probes");
            assert_eq!(log.lines().collect::<Vec<_>>(), vec!["--version"]);
        }

        #[test]
        fn missing_local_tool_stays_missing() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let mut local = LocalCli::new(
                ToolCommand::new(tmp.path().join("mmdc").to_string_lossy()),
                Theme::Neutral,
            );
            for _ in 0..2 {
                assert_eq!(
                    local.detect(),
                    Detection::Unavailable("mermaid-cli not found".to_string())
                );
            }
        }

        #[test]
        fn missing_local_tool_is_skipped() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let npx = write_script(tmp.path(), "npx", WRITES_OUTPUT);
            let source = DiagramSource::new(tmp.path().join("flow.mmd"), tmp.path());

            let mut local = LocalCli::new(
                ToolCommand::new(tmp.path().join("mmdc").to_string_lossy()),
                Theme::Neutral,
            );
            assert!(matches!(local.detect(), Detection::Unavailable(_)));

            let mut chain = StrategyChain::new().with(local).with(PackageRunner::new(
                ToolCommand::new(npx.to_string_lossy()),
                Theme::Neutral,
            ));
            assert!(chain.run(&source));
        }
    }
}
