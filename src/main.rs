// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::Path;
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, TranslationProvider};
use app_controller::Controller;

mod app_config;
mod translation;
mod sync;
mod history;
mod file_utils;
mod app_controller;
mod language_utils;
mod providers;
mod errors;

/// ValueEnum-capable mirror of TranslationProvider
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// ValueEnum-capable mirror of the config LogLevel
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect source changes and translate them into every target language (default command)
    #[command(alias = "run")]
    Sync(SyncArgs),

    /// Show pending changes without translating or writing anything
    Status {
        /// Path of the config file
        #[arg(short, long, default_value = "locsync.json")]
        config_path: String,
    },

    /// Show recent sync runs recorded in the history database
    History {
        /// Path of the config file
        #[arg(short, long, default_value = "locsync.json")]
        config_path: String,

        /// Number of runs to display
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Generate shell completions for locsync
    Completions {
        /// Shell dialect to emit
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SyncArgs {
    /// Locales directory holding one subdirectory per language
    #[arg(value_name = "LOCALES_DIR")]
    locales_dir: Option<String>,

    /// Ignore the snapshot and treat every source key as new
    #[arg(short, long)]
    force_full: bool,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model the backend should run
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g. 'en' or 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes, comma separated (e.g., 'es,fr,de')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Path of the config file
    #[arg(short, long, default_value = "locsync.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// locsync - Localization Sync with AI
///
/// An incremental translation tool that keeps per-language JSON bundles
/// in sync with a source language tree using various AI providers
/// (Ollama, OpenAI, Anthropic).
#[derive(Parser, Debug)]
#[command(name = "locsync")]
#[command(author = "locsync contributors")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered localization bundle sync tool")]
#[command(long_about = "locsync diffs the source-language JSON tree against the snapshot taken by the
previous run and translates only the keys that changed.

EXAMPLES:
    locsync                                     # Sync using default config
    locsync --force-full                        # Retranslate everything from scratch
    locsync -p openai -m gpt-4o-mini            # Use specific provider and model
    locsync -s en -t es,fr,de                   # Override source and target languages
    locsync status                              # List pending changes without syncing
    locsync history -n 20                       # Show the last 20 recorded runs
    locsync --log-level debug                   # Sync with debug logging
    locsync completions bash > locsync.bash     # Generate bash completions

CONFIGURATION:
    Settings are read from locsync.json by default; point --config-path at
    another file to override. A missing config file is written with defaults
    on the first sync run.

SUPPORTED PROVIDERS:
    ollama    - local Ollama server (default model llama3.2:3b)
    openai    - OpenAI API, needs an API key
    anthropic - Anthropic API, needs an API key
    lmstudio  - LM Studio local server, OpenAI-compatible on http://localhost:1234/v1")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Locales directory holding one subdirectory per language
    #[arg(value_name = "LOCALES_DIR")]
    locales_dir: Option<String>,

    /// Ignore the snapshot and treat every source key as new
    #[arg(short, long)]
    force_full: bool,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model the backend should run
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g. 'en' or 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes, comma separated (e.g., 'es,fr,de')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Path of the config file
    #[arg(short, long, default_value = "locsync.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Terminal logger writing colored, emoji-tagged lines to stderr
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Process-wide logger with the given level floor
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code and emoji tag for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("31", "❌ "),
            Level::Warn => ("33", "🚧 "),
            Level::Info => ("32", " "),
            Level::Debug => ("36", "🔍 "),
            Level::Trace => ("35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, emoji) = Self::style_for_level(record.level());

        let _ = writeln!(
            std::io::stderr(),
            "\x1B[1;{}m{} {} {}\x1B[0m",
            color, timestamp, emoji, record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @returns: log::LevelFilter matching a config log level
fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging starts at info; the effective level is adjusted once the
    // command line and config have been read
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "locsync", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Status { config_path }) => run_status(&config_path),
        Some(Commands::History { config_path, limit }) => run_history(&config_path, limit).await,
        Some(Commands::Sync(args)) => run_sync(args).await,
        None => {
            // Default behavior - plain `locsync` syncs using the top-level args
            let sync_args = SyncArgs {
                locales_dir: cli.locales_dir,
                force_full: cli.force_full,
                provider: cli.provider,
                model: cli.model,
                source_language: cli.source_language,
                target_languages: cli.target_languages,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_sync(sync_args).await
        }
    }
}

async fn run_sync(options: SyncArgs) -> Result<()> {
    // A log level given on the command line wins immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let config = load_or_create_config(&options)?;

    config.validate()
        .context("Invalid configuration")?;

    // Without a command line override the config file decides the log level
    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;
    controller.run(options.force_full).await?;

    Ok(())
}

/// Load the config file and fold the command line overrides into it.
///
/// A missing file is replaced by a freshly written default config, so a
/// bare first run leaves an editable locsync.json behind.
fn load_or_create_config(options: &SyncArgs) -> Result<Config> {
    let config_path = &options.config_path;

    let mut config: Config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Could not open config file: {}", config_path))?;
        serde_json::from_reader(BufReader::new(file))
            .context(format!("Could not parse config file: {}", config_path))?
    } else {
        warn!("No config file at '{}', writing defaults there.", config_path);

        let mut config = Config::default();

        // A locales dir named on the first run is worth remembering
        if let Some(locales_dir) = &options.locales_dir {
            config.locales_dir = locales_dir.clone();
        }
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        let config_json = serde_json::to_string_pretty(&config)
            .context("Could not serialize the default config")?;
        std::fs::write(config_path, config_json)
            .context(format!("Could not write default config to: {}", config_path))?;

        config
    };

    if let Some(locales_dir) = &options.locales_dir {
        config.locales_dir = locales_dir.clone();
    }

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // The model belongs to the active provider's catalogue entry
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_langs) = &options.target_languages {
        config.target_languages = target_langs.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

fn run_status(config_path: &str) -> Result<()> {
    let config = load_existing_config(config_path)?;
    config.validate()
        .context("Invalid configuration")?;
    log::set_max_level(to_level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let plan = controller.status()?;

    if !plan.has_changes() {
        info!("Already up to date, nothing to sync");
        return Ok(());
    }

    info!("{} new, {} modified, {} deleted key(s) across {} changed document(s)",
          plan.total_new(), plan.total_modified(), plan.total_deleted(), plan.changes.len());
    for (document, changes) in &plan.changes {
        info!("  {}: +{} ~{} -{}",
              document,
              changes.new_keys.len(),
              changes.modified_keys.len(),
              changes.deleted_keys.len());
    }
    if !plan.new_documents.is_empty() {
        info!("New document(s): {}", plan.new_documents.join(", "));
    }

    Ok(())
}

async fn run_history(config_path: &str, limit: usize) -> Result<()> {
    let config = load_existing_config(config_path)?;
    log::set_max_level(to_level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let runs = controller.recent_history(limit).await?;

    if runs.is_empty() {
        info!("No sync runs recorded yet");
        return Ok(());
    }

    for run in &runs {
        info!("{}", run.describe());
    }

    Ok(())
}

// Helper to load a config for read-only commands, never creating one on miss
fn load_existing_config(config_path: &str) -> Result<Config> {
    if !Path::new(config_path).exists() {
        return Err(anyhow!(
            "Config file not found at '{}'. Run 'locsync' once to create a default one.",
            config_path
        ));
    }

    let file = File::open(config_path)
        .context(format!("Could not open config file: {}", config_path))?;

    let reader = BufReader::new(file);
    let config: Config = serde_json::from_reader(reader)
        .context(format!("Could not parse config file: {}", config_path))?;

    Ok(config)
}
