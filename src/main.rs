//! clusage - Browse Claude usage history in the terminal

use clap::Parser;
use clusage::{
    cli::{Cli, Command},
    summary::{run_compare, run_summary},
    viewer::{ViewerOptions, run_history_viewer},
};
use clusage_core::{Clock, ClusageError, I18n, Result, paths};
use clusage_history::DailyFileReader;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const VIEWER_LOG_FILE: &str = "viewer.log";

fn env_filter(cli: &Cli) -> EnvFilter {
    // --quiet and --verbose override RUST_LOG
    match cli.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clusage=info")),
    }
}

/// Open `logs/viewer.log` under the data directory for appending
fn open_viewer_log(base: &Path) -> std::io::Result<File> {
    let dir = paths::logs_dir(base);
    fs::create_dir_all(&dir)?;
    File::options()
        .create(true)
        .append(true)
        .open(dir.join(VIEWER_LOG_FILE))
}

/// Install the subscriber
///
/// The viewer owns the terminal, so its log goes to a file; when the file
/// cannot be opened the viewer runs without a log. Batch commands log to
/// stderr.
fn init_logging(cli: &Cli, options: &ViewerOptions) {
    let filter = env_filter(cli);
    if cli.is_interactive() {
        match options.base_dir().and_then(|base| open_viewer_log(&base).map_err(ClusageError::from)) {
            Ok(file) => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init(),
            Err(_) => tracing_subscriber::registry().with(filter).init(),
        }
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, options: ViewerOptions) -> Result<()> {
    match cli.command() {
        Command::View(args) => {
            info!("Starting history viewer");
            run_history_viewer(ViewerOptions {
                use_alt_screen: !args.no_alt_screen,
                ..options
            })
            .await
        }
        Command::Summary(args) => {
            info!("Running usage summary");
            let settings = options.settings()?;
            let i18n = options.i18n(&settings);
            let reader = DailyFileReader::new(options.base_dir()?);
            let tz = options.timezone.tz;
            let today = Clock::system(tz).today();
            match args.compare {
                Some(mode) => run_compare(&reader, mode, today, &i18n, &settings, args.cost).await,
                None => run_summary(&reader, args.period, today, tz, &i18n, &settings, args.cost).await,
            }
        }
    }
}

/// Localized message for a fatal error
fn describe(error: &ClusageError, options: &ViewerOptions) -> String {
    let i18n = options
        .settings()
        .map(|settings| options.i18n(&settings))
        .unwrap_or_else(|_| I18n::detect(&Default::default()));
    let message = match error {
        ClusageError::TerminalNotInteractive => i18n.t("error.notInteractive"),
        other => other.to_string(),
    };
    format!("{}: {}", i18n.t("error.prefix"), message)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let options = match cli.timezone_args.resolve() {
        Ok(timezone) => ViewerOptions {
            timezone,
            data_dir: cli.data_dir.clone(),
            locale: cli.lang,
            ..ViewerOptions::default()
        },
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    if cli.no_color {
        colored::control::set_override(false);
        console::set_colors_enabled(false);
    }
    init_logging(&cli, &options);
    info!("Using timezone: {}", options.timezone.display_name());

    if let Err(e) = run(cli, options.clone()).await {
        warn!("Exiting with error: {}", e);
        eprintln!("{}", describe(&e, &options));
        std::process::exit(1);
    }
}
