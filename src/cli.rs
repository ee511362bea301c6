//! CLI parsing and orchestration. Parses args, sets up logging, writes a template or runs the
//! generation pipeline, and maps errors to exit codes.

use crate::cache::{CachingFetcher, CACHE_DIR};
use crate::config::{self, ConfigError};
use crate::fetch::FetchError;
use crate::pipeline::{generate, GenerateError, Report, UrlOutcome};
use crate::project::AssembleError;
use crate::settings::{load_settings, Settings, SettingsError};
use clap::Parser;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors that end the run with a non-zero exit code. Per-URL failures are not among them.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("{0}")]
    Assemble(#[from] AssembleError),
}

impl From<GenerateError> for CliRunError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Config(e) => CliRunError::Config(e),
            GenerateError::Assemble(e) => CliRunError::Assemble(e),
        }
    }
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::Config(_) | CliRunError::Settings(_) | CliRunError::Client(_) => 1,
            CliRunError::Assemble(_) => 2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "web2ebook")]
#[command(about = "Turn a curated list of web articles into an asciidoc ebook project")]
#[command(
    after_help = "Settings file keys (user_agent, timeout_secs, request_delay_secs) are read from --settings, else ./web2ebook.toml or ~/.config/web2ebook/config.toml. CLI flags override them. Fetched pages are cached in <output_dir>/.cached. Build the generated project with `make` in its output directory."
)]
pub struct Args {
    /// Write a template config to --input instead of generating.
    #[arg(long)]
    pub new: bool,

    /// Allow --new to overwrite an existing config file.
    #[arg(long)]
    pub force: bool,

    /// Project config (JSON).
    #[arg(short, long, default_value = "web2ebook.json")]
    pub input: PathBuf,

    /// Settings file (TOML). Must exist when given.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Ignore cached pages and fetch every URL again.
    #[arg(long)]
    pub refresh: bool,

    /// HTTP User-Agent (overrides settings).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides settings; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Delay between requests in seconds (overrides settings; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and the full error chain.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flag-derived default.
pub fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(args)));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn default_log_directive(args: &Args) -> &'static str {
    if args.quiet {
        "web2ebook=warn"
    } else if args.verbose {
        "web2ebook=debug"
    } else {
        "web2ebook=info"
    }
}

/// Flag values as the top settings layer.
fn flag_settings(args: &Args) -> Settings {
    Settings {
        user_agent: args.user_agent.clone(),
        timeout_secs: args.timeout,
        request_delay_secs: args.delay,
    }
}

/// Per-URL summary. With `quiet` only failures and the totals line are listed.
fn format_report(report: &Report, quiet: bool) -> String {
    let mut out = String::new();
    for entry in &report.urls {
        match &entry.outcome {
            UrlOutcome::Written { title, file_name } => {
                if !quiet {
                    let _ = writeln!(out, "ok      {} -> {} ({})", entry.url, file_name, title);
                }
            }
            UrlOutcome::Failed(e) => {
                let _ = writeln!(out, "failed  {} ({}): {}", entry.url, e.kind(), e);
            }
        }
    }
    let _ = writeln!(
        out,
        "Wrote {} of {} chapters to {}",
        report.succeeded(),
        report.urls.len(),
        report.output.index.display()
    );
    out
}

/// Entry point for the CLI. Returns Ok(()) on full or partial success.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    if args.new {
        config::generate_template(&args.input, args.force)?;
        if !args.quiet {
            eprintln!("Wrote template {}", args.input.display());
        }
        return Ok(());
    }

    let config = config::load(&args.input)?;
    let settings = load_settings(args.settings.as_deref())?.overridden_by(flag_settings(args));
    let http = settings
        .fetcher_builder()
        .build()
        .map_err(CliRunError::Client)?;
    let mut fetcher =
        CachingFetcher::new(http, config.output_dir.join(CACHE_DIR)).refresh(args.refresh);
    info!(
        input = %args.input.display(),
        urls = config.urls.len(),
        output_dir = %config.output_dir.display(),
        "generating"
    );

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: u32, total: u32| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            {
                bar.set_style(
                    style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n as u64);
        pb.set_message(format!("Fetching article {}/{}", n, total));
    };
    let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&progress_cb) };

    let result = generate(&config, &mut fetcher, progress);

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    let report = result?;
    eprint!("{}", format_report(&report, args.quiet));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;
    use crate::pipeline::{ChapterError, UrlReport};
    use crate::profile::ProfileError;
    use crate::project::ProjectOutput;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("web2ebook").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let a = args(&[]);
        assert!(!a.new);
        assert!(!a.force);
        assert_eq!(a.input, PathBuf::from("web2ebook.json"));
        assert!(a.user_agent.is_none());
        assert!(a.timeout.is_none());
        assert!(a.delay.is_none());
        assert!(a.settings.is_none());
        assert!(!a.refresh);
    }

    #[test]
    fn parses_all_flags() {
        let a = args(&[
            "--new",
            "--force",
            "-i",
            "book.json",
            "--user-agent",
            "Test/1.0",
            "--timeout",
            "5",
            "--delay",
            "0",
            "--settings",
            "fetch.toml",
            "--refresh",
            "-q",
            "-v",
        ]);
        assert!(a.new && a.force && a.quiet && a.verbose);
        assert_eq!(a.input, PathBuf::from("book.json"));
        assert_eq!(a.user_agent.as_deref(), Some("Test/1.0"));
        assert_eq!(a.timeout, Some(5));
        assert_eq!(a.delay, Some(0));
        assert_eq!(a.settings, Some(PathBuf::from("fetch.toml")));
        assert!(a.refresh);
    }

    #[test]
    fn flags_override_only_what_they_set() {
        let file = Settings {
            user_agent: Some("File/1.0".to_string()),
            timeout_secs: Some(60),
            request_delay_secs: Some(3),
        };
        let merged = file.overridden_by(flag_settings(&args(&["--delay", "0"])));
        assert_eq!(merged.user_agent.as_deref(), Some("File/1.0"));
        assert_eq!(merged.timeout_secs, Some(60));
        assert_eq!(merged.request_delay_secs, Some(0));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Args::try_parse_from(["web2ebook", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn log_directive_follows_flags() {
        assert_eq!(default_log_directive(&args(&[])), "web2ebook=info");
        assert_eq!(default_log_directive(&args(&["-q"])), "web2ebook=warn");
        assert_eq!(default_log_directive(&args(&["-v"])), "web2ebook=debug");
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(
            CliRunError::Config(ConfigError::EmptyField { field: "title" }).exit_code(),
            1
        );
        let settings = SettingsError::Read {
            path: PathBuf::from("fetch.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(CliRunError::Settings(settings).exit_code(), 1);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let assemble = AssembleError::Io {
            path: PathBuf::from("book/index.asciidoc"),
            source: io,
        };
        assert_eq!(CliRunError::Assemble(assemble).exit_code(), 2);
    }

    #[test]
    fn generate_errors_map_to_matching_exit_codes() {
        let e: CliRunError = GenerateError::Config(ConfigError::DuplicateUrl {
            url: "https://fs.blog/a".into(),
        })
        .into();
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn new_refuses_to_overwrite_without_force() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("book.json");
        std::fs::write(&path, "{}")?;
        let input = path.to_string_lossy().into_owned();

        let err = run(&args(&["--new", "-q", "-i", &input])).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(std::fs::read_to_string(&path)?, "{}");

        run(&args(&["--new", "--force", "-q", "-i", &input]))?;
        assert!(std::fs::read_to_string(&path)?.contains("\"urls\""));
        Ok(())
    }

    #[test]
    fn missing_input_is_config_error() {
        let err = run(&args(&["-q", "-i", "/nonexistent_dir_web2ebook_xyz/book.json"])).unwrap_err();
        assert!(matches!(err, CliRunError::Config(ConfigError::Read { .. })));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn report_lists_every_url() {
        let report = Report {
            urls: vec![
                UrlReport {
                    url: "https://fs.blog/a/".into(),
                    outcome: UrlOutcome::Written {
                        title: "A".into(),
                        file_name: "chapters/a.asciidoc".into(),
                    },
                },
                UrlReport {
                    url: "https://other.example/b".into(),
                    outcome: UrlOutcome::Failed(ChapterError::UnsupportedSite(
                        ProfileError::UnsupportedSite {
                            host: "other.example".into(),
                        },
                    )),
                },
                UrlReport {
                    url: "https://untools.co/c".into(),
                    outcome: UrlOutcome::Failed(ChapterError::Extract(ExtractError::EmptyContent {
                        url: "https://untools.co/c".into(),
                    })),
                },
            ],
            output: ProjectOutput {
                index: PathBuf::from("book/index.asciidoc"),
                ..ProjectOutput::default()
            },
        };

        let full = format_report(&report, false);
        assert!(full.contains("ok      https://fs.blog/a/ -> chapters/a.asciidoc (A)"));
        assert!(full.contains("failed  https://other.example/b (unsupported site)"));
        assert!(full.contains("failed  https://untools.co/c (extraction)"));
        assert!(full.ends_with("Wrote 1 of 3 chapters to book/index.asciidoc\n"));

        let quiet = format_report(&report, true);
        assert!(!quiet.contains("ok      "));
        assert_eq!(quiet.matches("failed  ").count(), 2);
    }
}
