use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::{self, IsTerminal};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use textscout::{
    run_search, ConfigOverrides, JsonReporter, Reporter, SearchConfig, SearchError, TextReporter,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON, YAML or TOML)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Root directory to search in
    #[arg(short = 'd', long = "root")]
    root_directory: Option<PathBuf>,

    /// Literal text to search for
    #[arg(short = 't', long = "text")]
    search_text: Option<String>,

    /// Number of worker threads
    #[arg(short = 'j', long = "workers")]
    num_workers: Option<NonZeroUsize>,

    /// File extensions to include (e.g. .txt,.md); an empty value searches every file
    #[arg(short = 'e', long = "extensions")]
    extensions: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_directory: self.root_directory.clone(),
            search_text: self.search_text.clone(),
            num_workers: self.num_workers,
            allowed_extensions: self.extensions.as_deref().map(parse_extensions),
            log_level: self.log_level.clone(),
        }
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    // A second initialization (e.g. under a test harness) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .try_init();
}

fn print_banner(config: &SearchConfig) {
    println!("==================================================");
    println!(" textscout: parallel text search");
    println!("==================================================");
    println!("Root directory:  {}", config.root_directory.display());
    println!("Search text:     {:?}", config.search_text);
    println!("Workers:         {}", config.num_workers);
    println!("Extensions:      {:?}", config.allowed_extensions);
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = SearchConfig::load_from(&cli.config)?.merge_with_cli(cli.overrides());
    init_logging(&config.log_level);
    debug!("Loaded {}: {:?}", cli.config.display(), config);

    if cli.format == OutputFormat::Text {
        print_banner(&config);
    }

    let stdout = io::stdout().lock();
    let mut reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Text => Box::new(TextReporter::new(stdout).with_color(!cli.no_color)),
        OutputFormat::Json => Box::new(JsonReporter::new(stdout)),
    };

    match run_search(&config, reporter.as_mut())? {
        Some(summary) => info!(
            "{} matching lines in {} files, {} errors",
            summary.total_matches, summary.files_with_matches, summary.error_count
        ),
        None => eprintln!("Search text is empty, nothing to do"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".txt, .md"), vec![".txt", ".md"]);
        assert_eq!(parse_extensions("rs"), vec!["rs"]);
        assert!(parse_extensions("").is_empty());
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "textscout", "-t", "needle", "-j", "8", "-e", ".txt,.LOG", "-d", "src",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.search_text.as_deref(), Some("needle"));
        assert_eq!(overrides.num_workers, NonZeroUsize::new(8));
        assert_eq!(
            overrides.allowed_extensions,
            Some(vec![".txt".to_string(), ".LOG".to_string()])
        );
        assert_eq!(overrides.root_directory, Some(PathBuf::from("src")));
        assert_eq!(overrides.log_level, None);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Cli::try_parse_from(["textscout", "-j", "0"]).is_err());
    }
}
