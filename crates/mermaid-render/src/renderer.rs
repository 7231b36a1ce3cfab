use crate::config::RenderConfig;
use crate::error::Result;
use crate::source::{DiagramSource, ensure_render_dir, find_sources, require_base_dir};
use crate::strategy::StrategyChain;
use std::fmt;
use std::path::Path;

const SEPARATOR: &str = "\n-----------------------------------\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.attempted == self.succeeded
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.attempted)
    }
}

/// Drives the strategy chain over one file or a whole directory, sequentially.
pub struct Renderer {
    config: RenderConfig,
    chain: StrategyChain,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let chain = StrategyChain::standard(&config);
        Self { config, chain }
    }

    pub fn with_chain(config: RenderConfig, chain: StrategyChain) -> Self {
        Self { config, chain }
    }

    /// Creates the output directory once, before any file is rendered. The base directory has
    /// to exist already.
    pub fn prepare(&self) -> Result<()> {
        require_base_dir(&self.config.base_dir)?;
        if ensure_render_dir(&self.config.render_dir)? {
            println!(
                "Created render directory: {}",
                self.config.render_dir.display()
            );
        }
        Ok(())
    }

    /// `true` if some strategy left an SVG at the destination.
    pub fn render_file(&mut self, input: &Path) -> bool {
        let source = DiagramSource::new(input, &self.config.render_dir);
        println!(
            "Rendering {} → {}",
            source.input.display(),
            source.output.display()
        );
        self.chain.run(&source)
    }

    /// Renders every `*.mmd` directly under the base directory.
    pub fn render_all(&mut self) -> Result<BatchSummary> {
        let sources = find_sources(&self.config.base_dir)?;
        if sources.is_empty() {
            println!(
                "No .mmd files found in {}.",
                self.config.base_dir.display()
            );
            return Ok(BatchSummary::default());
        }

        println!("Found {} Mermaid files to render.", sources.len());

        let mut summary = BatchSummary {
            attempted: sources.len(),
            succeeded: 0,
        };
        for source in &sources {
            if self.render_file(source) {
                summary.succeeded += 1;
            }
            println!("{SEPARATOR}");
        }

        println!("Rendering complete: {summary} files rendered successfully.");
        println!(
            "SVG files are saved in the '{}' directory",
            self.config.render_dir.display()
        );
        Ok(summary)
    }
}
