use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File must have a .mmd extension")]
    InvalidExtension { path: PathBuf },

    #[error("File not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read file {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one external renderer invocation. Always recoverable: the chain moves on.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` failed with {status}")]
    Exit {
        program: String,
        code: Option<i32>,
        /// `exit code N`, or the platform's description when no code is available.
        status: String,
        stderr: String,
    },

    #[error("failed to remove previous output {}: {source}", output.display())]
    StaleOutput {
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited successfully but did not create {}", output.display())]
    MissingOutput { program: String, output: PathBuf },
}

impl ToolError {
    /// Captured stderr of a failed run, if the tool wrote anything.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::Exit { stderr, .. } if !stderr.trim().is_empty() => Some(stderr.trim_end()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ToolError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
