// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use promobot::Controller;
use promobot::app_config::{self, Config};
use promobot::errors::AppError;

/// CLI Wrapper for LogLevel to implement ValueEnum
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

fn level_filter(level: app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot and serve conversations (default command)
    Run,

    /// Load and validate the configuration, then print a redacted summary
    CheckConfig,

    /// Generate shell completions for promobot
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// promobot - Telegram bot that turns a short brief into an ad video
#[derive(Parser, Debug)]
#[command(name = "promobot")]
#[command(version)]
#[command(about = "Telegram bot that collects an ad brief and renders it into a video")]
#[command(long_about = "promobot collects product, audience, tone, duration and aspect ratio in a chat,
submits a video generation job to the rendering API and replies with the result.

EXAMPLES:
    promobot                              # Run the bot with conf.json + environment
    promobot -l debug run                 # Run with debug logging
    promobot -c /etc/promobot.json run    # Use a different config file
    promobot check-config                 # Validate configuration and exit
    promobot completions bash > promobot.bash

CONFIGURATION:
    Required environment variables (also read from a .env file):
        TG_BOT_TOKEN    Telegram bot token
        SORA_API_BASE   Base URL of the rendering API
        SORA_API_KEY    API key of the rendering API
    Optional tuning (retry policies, polling schedule, endpoints) lives in
    conf.json. A missing config file means defaults.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        log::set_max_level(level_filter(cmd_log_level.clone().into()));
    }

    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "promobot", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::CheckConfig) => {
            let config = load_config(&cli)?;
            println!("{}", config.redacted_summary());
            Ok(())
        }
        Some(Commands::Run) | None => {
            let config = load_config(&cli)?;
            run_bot(config).await
        }
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config = Config::load(&cli.config_path).map_err(|e| AppError::Config(format!("{:#}", e)))?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(level_filter(config.log_level));
    }

    Ok(config)
}

async fn run_bot(config: Config) -> Result<()> {
    info!(
        "Starting promobot (render API: {}, hard timeout {}s)",
        config.render.api_base, config.polling.hard_timeout_secs
    );

    let controller = Controller::with_config(config)?;
    controller.run().await?;

    info!("promobot stopped");
    Ok(())
}
