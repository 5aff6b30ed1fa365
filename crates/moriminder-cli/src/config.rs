use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use moriminder_core::models::ReminderConfig;
use serde::Deserialize;

use crate::timezone::detect_system_timezone;

pub const CONFIG_FILE: &str = "moriminder.toml";

/// CLI configuration, read from `moriminder.toml` and `MORIMINDER_` variables.
///
/// ```toml
/// [reminders]
/// notification_ceiling = 64
/// default_interval_minutes = 60
/// timezone = "Europe/Berlin"
/// ```
#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_reminders")]
    pub reminders: ReminderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminders: default_reminders(),
        }
    }
}

/// Core defaults, with the calendar following the system timezone.
fn default_reminders() -> ReminderConfig {
    ReminderConfig {
        timezone: detect_system_timezone(),
        ..ReminderConfig::default()
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("MORIMINDER_").split("__"))
    }
}
