//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pom_core::OutputFilter;
use pom_store::{DEFAULT_RUNNING_CSV_NAME, OutputSettings};
use serde::{Deserialize, Serialize};

/// File name of the event ledger inside `data_dir`.
pub const LEDGER_FILE_NAME: &str = "pom-data.csv";

/// Shortest log retention accepted, in days.
pub const MIN_LOG_RETENTION_DAYS: u32 = 5;

/// Application configuration.
///
/// Output directories left empty disable that output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the ledger and log files live.
    pub data_dir: PathBuf,
    pub daily_csv_dir: PathBuf,
    pub running_csv_dir: PathBuf,
    pub running_csv_name: String,
    pub daily_md_dir: PathBuf,
    /// Section heading in the day note; empty means `# Pomodori <date>`.
    pub daily_md_heading: String,
    /// Only merge into day notes that already exist.
    pub daily_md_append: bool,
    /// Filter codes for CSV output, e.g. `"RX"`.
    pub filter_csv: String,
    pub filter_md: String,
    /// Default session length.
    pub session_minutes: u32,
    pub log_retention_days: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("daily_csv_dir", &self.daily_csv_dir)
            .field("running_csv_dir", &self.running_csv_dir)
            .field("daily_md_dir", &self.daily_md_dir)
            .field("filter_csv", &self.filter_csv)
            .field("filter_md", &self.filter_md)
            .field("session_minutes", &self.session_minutes)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            daily_csv_dir: PathBuf::new(),
            running_csv_dir: PathBuf::new(),
            running_csv_name: DEFAULT_RUNNING_CSV_NAME.to_string(),
            daily_md_dir: PathBuf::new(),
            daily_md_heading: String::new(),
            daily_md_append: false,
            filter_csv: String::new(),
            filter_md: String::new(),
            session_minutes: 25,
            log_retention_days: 30,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `<config_dir>/pom/config.toml`, the
    /// given file, then `POM_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("POM_"));

        figment.extract()
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn log_retention_days(&self) -> u32 {
        self.log_retention_days.max(MIN_LOG_RETENTION_DAYS)
    }

    pub fn session_seconds(&self) -> u32 {
        self.session_minutes.saturating_mul(60)
    }

    /// The output half of the configuration, as the store expects it.
    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            daily_csv_dir: enabled_dir(&self.daily_csv_dir),
            running_csv_dir: enabled_dir(&self.running_csv_dir),
            running_csv_name: self.running_csv_name.clone(),
            daily_md_dir: enabled_dir(&self.daily_md_dir),
            daily_md_heading: self.daily_md_heading.clone(),
            daily_md_append: self.daily_md_append,
            filter_csv: OutputFilter::from_codes(&self.filter_csv),
            filter_md: OutputFilter::from_codes(&self.filter_md),
        }
    }
}

fn enabled_dir(dir: &Path) -> Option<PathBuf> {
    (!dir.as_os_str().is_empty()).then(|| dir.to_path_buf())
}

/// Returns the platform-specific config directory for pom.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pom"))
}

/// Returns the platform-specific data directory for pom.
///
/// On Linux: `~/.local/share/pom`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("pom"))
}
