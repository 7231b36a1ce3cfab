use crate::config::Theme;
use crate::error::ToolError;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// An external renderer: a program plus the arguments that always precede the render flags
/// (`npx @mermaid-js/mermaid-cli ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    leading_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_arg(mut self, arg: impl Into<String>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Human-readable command prefix, e.g. `npx @mermaid-js/mermaid-cli`.
    pub fn display_name(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.leading_args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }

    fn command(&self) -> Command {
        // npm installs `npx`/`mmdc` as `.cmd` shims on Windows, which `CreateProcess` does not
        // resolve on its own.
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd.exe");
            cmd.arg("/c").arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(&self.leading_args);
        cmd
    }

    /// `<tool> --version` exits zero.
    pub fn is_invocable(&self) -> bool {
        let mut cmd = self.command();
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match cmd.output() {
            Ok(out) => {
                tracing::debug!(
                    tool = %self.display_name(),
                    status = %out.status,
                    version = %String::from_utf8_lossy(&out.stdout).trim(),
                    "probed renderer"
                );
                out.status.success()
            }
            Err(err) => {
                tracing::debug!(tool = %self.display_name(), %err, "renderer not invocable");
                false
            }
        }
    }

    /// Runs `<tool> -i <input> -o <output> -t <theme>` and blocks until it exits.
    ///
    /// Succeeds only if the tool exits zero and `output` exists afterwards. A previous `output`
    /// is removed first so a run that writes nothing cannot pass.
    pub fn render(&self, input: &Path, output: &Path, theme: Theme) -> Result<(), ToolError> {
        match fs::remove_file(output) {
            Ok(()) => tracing::debug!(output = %output.display(), "removed previous output"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ToolError::StaleOutput {
                    output: output.to_path_buf(),
                    source,
                });
            }
        }

        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-t")
            .arg(OsStr::new(theme.as_str()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(command = ?cmd, "running renderer");

        let out = cmd.output().map_err(|source| ToolError::Spawn {
            program: self.display_name(),
            source,
        })?;

        if !out.status.success() {
            let status = match out.status.code() {
                Some(code) => format!("exit code {code}"),
                None => out.status.to_string(),
            };
            return Err(ToolError::Exit {
                program: self.display_name(),
                code: out.status.code(),
                status,
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }

        if !output.is_file() {
            return Err(ToolError::MissingOutput {
                program: self.display_name(),
                output: output.to_path_buf(),
            });
        }
        Ok(())
    }
}
