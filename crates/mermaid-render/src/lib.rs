#![forbid(unsafe_code)]

//! Render Mermaid (`.mmd`) sources into SVG files for developer documentation.
//!
//! Rendering is delegated to external tools. Each source goes through an ordered
//! [`StrategyChain`]:
//! - the locally installed `mmdc` (if `mmdc --version` succeeds)
//! - `npx @mermaid-js/mermaid-cli` with the same arguments
//! - a browser-assisted export: a scratch HTML page renders the diagram client-side and the
//!   operator saves it manually or pastes it back as base64 on the console
//!
//! The first strategy that leaves an SVG at the destination wins.

pub mod browser;
pub mod config;
pub mod error;
pub mod prompt;
pub mod renderer;
pub mod source;
pub mod strategy;
pub mod tool;

pub use browser::{BrowserFallback, BrowserPage};
pub use config::{RenderConfig, Theme};
pub use error::{Error, Result, ToolError};
pub use prompt::{ConsolePrompt, PasteOutcome, PasteSource, PromptInterrupt};
pub use renderer::{BatchSummary, Renderer};
pub use source::{
    DiagramSource, ensure_render_dir, find_sources, require_base_dir, validate_source_path,
};
pub use strategy::{Detection, LocalCli, PackageRunner, RenderAttempt, RenderStrategy, StrategyChain};
pub use tool::ToolCommand;
