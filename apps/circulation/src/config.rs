//! Circulation desk configuration.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>`, or `./libris.toml` when present)
//! 3. `LIBRIS__*` environment variables, `__` between path segments
//!
//! ```toml
//! database_path = "/var/lib/libris/libris.db"
//! log_level = "info,libris_db=debug"
//!
//! [policies.privileged]
//! max_active_loans = 12
//! grace_period_days = 5
//! ```
//!
//! Equivalent environment override:
//! `LIBRIS__POLICIES__PRIVILEGED__MAX_ACTIVE_LOANS=12`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use libris_core::money::{Money, RateMultiplier};
use libris_core::{BorrowerClass, PolicyProfile, PolicyTable, ValidationError};

const DEFAULT_CONFIG_FILE: &str = "libris";
const ENV_PREFIX: &str = "LIBRIS";
const ENV_SEPARATOR: &str = "__";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid policy override for {class}: {source}")]
    InvalidPolicy {
        class: BorrowerClass,
        #[source]
        source: ValidationError,
    },
}

/// Partial policy row. Missing fields keep the canonical value for the class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileOverride {
    pub max_active_loans: Option<u32>,
    pub loan_duration_days: Option<u32>,
    pub grace_period_days: Option<u32>,
    pub base_daily_penalty_cents: Option<i64>,
    pub progressive_threshold_days: Option<u32>,
    pub progressive_multiplier_bps: Option<u32>,
}

impl ProfileOverride {
    /// Applies the override on top of `base`, validating the result.
    pub fn apply(&self, base: &PolicyProfile) -> Result<PolicyProfile, ValidationError> {
        PolicyProfile::new(
            self.max_active_loans.unwrap_or(base.max_active_loans()),
            self.loan_duration_days.unwrap_or(base.loan_duration_days()),
            self.grace_period_days.unwrap_or(base.grace_period_days()),
            self.base_daily_penalty_cents
                .map(Money::from_cents)
                .unwrap_or(base.base_daily_penalty()),
            self.progressive_threshold_days
                .unwrap_or(base.progressive_threshold_days()),
            self.progressive_multiplier_bps
                .map(RateMultiplier::from_bps)
                .unwrap_or(base.progressive_multiplier()),
        )
    }
}

/// Settings loaded once at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file
    pub database_path: PathBuf,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,

    /// Per-class policy overrides
    pub policies: HashMap<BorrowerClass, ProfileOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from("./libris.db"),
            log_level: "info".to_string(),
            policies: HashMap::new(),
        }
    }
}

impl Settings {
    /// Loads settings from an explicit file, or `./libris.toml` if it exists,
    /// then applies `LIBRIS__*` environment variables.
    ///
    /// An explicit path must exist. Policy overrides are validated here so
    /// a bad row aborts start-up instead of surfacing on the first borrow.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.policy_table()?;
        Ok(settings)
    }

    /// The canonical table with this configuration's overrides applied.
    pub fn policy_table(&self) -> Result<PolicyTable, SettingsError> {
        let mut table = PolicyTable::default();
        for (class, row) in &self.policies {
            let profile = row
                .apply(&PolicyProfile::for_class(*class))
                .map_err(|source| SettingsError::InvalidPolicy {
                    class: *class,
                    source,
                })?;
            table = table.with_profile(*class, profile);
        }
        Ok(table)
    }
}
