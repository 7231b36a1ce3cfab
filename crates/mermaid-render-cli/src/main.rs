use mermaid_render::{PromptInterrupt, RenderConfig, Renderer, Theme, validate_source_path};
use std::path::PathBuf;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Render(mermaid_render::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Render(err) => write!(f, "Error: {err}"),
        }
    }
}

impl From<mermaid_render::Error> for CliError {
    fn from(value: mermaid_render::Error) -> Self {
        Self::Render(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    help: bool,
    input: Option<PathBuf>,
    dir: Option<PathBuf>,
    theme: Theme,
    no_browser: bool,
    no_prompt: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "render\n\
\n\
USAGE:\n\
  render [--theme <name>] [--dir <path>] [--no-browser] [--no-prompt] [-v|--verbose] [<file>.mmd]\n\
\n\
NOTES:\n\
  - With <file>.mmd, renders just that file; otherwise renders every *.mmd in the directory.\n\
  - Output goes to <dir>/render/<name>.svg; <dir> defaults to the working directory.\n\
  - Tries `mmdc`, then `npx @mermaid-js/mermaid-cli`, then a browser page for manual export.\n\
  - Themes: default, neutral (default), dark, forest, base.\n\
  - --no-browser writes the browser page without opening it; --no-prompt skips the paste prompt.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => args.help = true,
            "--no-browser" => args.no_browser = true,
            "--no-prompt" => args.no_prompt = true,
            "--verbose" | "-v" => args.verbose = true,
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = theme
                    .parse::<Theme>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dir = Some(PathBuf::from(dir));
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(PathBuf::from(rest));
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(args)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Ctrl-C abandons a pending paste prompt and moves on; anywhere else it ends the run.
fn install_interrupt_handler(interrupt: PromptInterrupt) {
    let installed = ctrlc::set_handler(move || {
        if !interrupt.interrupt() {
            std::process::exit(130);
        }
    });
    if let Err(err) = installed {
        tracing::warn!(%err, "failed to install Ctrl-C handler");
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if let Some(input) = args.input.as_deref() {
        validate_source_path(input)?;
    }

    let base_dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = RenderConfig::new(base_dir)
        .with_theme(args.theme)
        .with_open_browser(!args.no_browser)
        .with_prompt_operator(!args.no_prompt);
    if config.prompt_operator {
        install_interrupt_handler(config.interrupt.clone());
    }
    tracing::debug!(?config, "starting");

    let mut renderer = Renderer::new(config);
    renderer.prepare()?;

    match args.input {
        Some(input) => {
            renderer.render_file(&input);
        }
        None => {
            renderer.render_all()?;
        }
    }
    Ok(())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if args.help {
        print!("{}", usage());
        return;
    }

    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
