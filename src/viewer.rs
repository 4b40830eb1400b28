//! Entry point of the interactive history viewer
//!
//! Wires the on-disk reader, settings, locale and clock into
//! [`ViewerServices`], loads the current month and hands a
//! [`CalendarView`] to the terminal shell.

use clusage_core::paths;
use clusage_core::{Clock, ClusageError, I18n, Locale, Result, Settings, TimezoneConfig};
use clusage_history::DailyFileReader;
use clusage_terminal::{AppOptions, LoadWaker, TerminalApp};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::views::{CalendarView, ViewerServices};

/// Host-side choices for a viewer session
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub use_alt_screen: bool,
    pub timezone: TimezoneConfig,
    /// Data directory; `~/.claudeusage` or `CLUSAGE_HOME` when unset
    pub data_dir: Option<PathBuf>,
    /// Locale forced on the command line
    pub locale: Option<Locale>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            use_alt_screen: true,
            timezone: TimezoneConfig::default(),
            data_dir: None,
            locale: None,
        }
    }
}

impl ViewerOptions {
    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::base_data_dir(),
        }
    }

    /// Settings from the data directory, defaults when absent
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings::load(&paths::settings_path(&self.base_dir()?)))
    }

    pub fn i18n(&self, settings: &Settings) -> I18n {
        match self.locale {
            Some(locale) => I18n::new(locale),
            None => I18n::detect(settings),
        }
    }
}

/// Build the collaborators every view shares
pub fn build_services(options: &ViewerOptions, waker: LoadWaker) -> Result<ViewerServices> {
    let base = options.base_dir()?;
    let settings = options.settings()?;
    let i18n = options.i18n(&settings);
    info!(
        "Viewer reading {} (timezone {}, locale {})",
        paths::daily_dir(&base).display(),
        options.timezone.display_name(),
        i18n.locale()
    );
    Ok(ViewerServices::new(
        Arc::new(DailyFileReader::new(base)),
        i18n,
        settings,
        Clock::system(options.timezone.tz),
        waker,
    ))
}

/// The first screen, with the current month already read
pub async fn initial_calendar(services: ViewerServices) -> Result<CalendarView> {
    let mut calendar = CalendarView::new(services)?;
    calendar.load_current_month().await;
    Ok(calendar)
}

/// Run the viewer until the user leaves it
///
/// Fails with [`ClusageError::TerminalNotInteractive`] before touching the
/// screen when stdin or stdout is not a terminal.
pub async fn run_history_viewer(options: ViewerOptions) -> Result<()> {
    if !is_terminal::is_terminal(std::io::stdin()) || !is_terminal::is_terminal(std::io::stdout()) {
        return Err(ClusageError::TerminalNotInteractive);
    }

    let waker = LoadWaker::new();
    let services = build_services(&options, waker.clone())?;
    let calendar = initial_calendar(services).await?;

    let mut app = TerminalApp::stdout(
        AppOptions {
            use_alt_screen: options.use_alt_screen,
            ..AppOptions::default()
        },
        waker,
    );
    app.push(Box::new(calendar))?;
    app.run().await?;
    info!("Viewer closed");
    Ok(())
}
