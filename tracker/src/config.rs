//! Tracker configuration loaded via OrthoConfig.
//!
//! Every value may come from `FOOD_TRACKER_*` environment variables or a
//! configuration file; unset values fall back to the defaults below.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{ConflictPolicy, PantryServiceConfig, ReminderDispatcherConfig};

const DEFAULT_FOOD_FACTS_BASE_URL: &str = "https://world.openfoodfacts.org/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_SCHEDULING_ATTEMPTS: u32 = 3;

/// Configuration values for the tracker binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOOD_TRACKER")]
pub struct TrackerSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Base URL of the product facts service.
    pub food_facts_base_url: Option<String>,
    /// Timeout for product facts requests, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Dispatcher pause between idle polls, in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Maximum reminders fired per poll.
    pub batch_size: Option<usize>,
    /// Attempts per reminder operation, including the first.
    pub scheduling_attempts: Option<u32>,
    /// Resolution of colliding explicit-id inserts.
    pub conflict_policy: Option<ConflictPolicy>,
}

impl TrackerSettings {
    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Product facts base URL, falling back to the public service.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn food_facts_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.food_facts_base_url
                .as_deref()
                .unwrap_or(DEFAULT_FOOD_FACTS_BASE_URL),
        )
    }

    /// Product facts request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Dispatcher tuning.
    pub fn dispatcher_config(&self) -> ReminderDispatcherConfig {
        ReminderDispatcherConfig {
            poll_interval: Duration::from_secs(
                self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
        }
    }

    /// Service tuning.
    pub fn pantry_config(&self) -> PantryServiceConfig {
        PantryServiceConfig {
            conflict_policy: self.conflict_policy.unwrap_or_default(),
            scheduling_attempts: self
                .scheduling_attempts
                .unwrap_or(DEFAULT_SCHEDULING_ATTEMPTS)
                .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for tracker configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "FOOD_TRACKER_DATABASE_URL",
        "FOOD_TRACKER_FOOD_FACTS_BASE_URL",
        "FOOD_TRACKER_REQUEST_TIMEOUT_SECS",
        "FOOD_TRACKER_POLL_INTERVAL_SECS",
        "FOOD_TRACKER_BATCH_SIZE",
        "FOOD_TRACKER_SCHEDULING_ATTEMPTS",
        "FOOD_TRACKER_CONFLICT_POLICY",
    ];

    fn load_from_empty_args() -> TrackerSettings {
        TrackerSettings::load_from_iter([OsString::from("food-tracker")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), None);
        assert_eq!(
            settings.food_facts_base_url().expect("default url").as_str(),
            DEFAULT_FOOD_FACTS_BASE_URL
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.dispatcher_config().poll_interval, Duration::from_secs(30));
        assert_eq!(settings.dispatcher_config().batch_size, 50);
        assert_eq!(settings.pantry_config(), PantryServiceConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "FOOD_TRACKER_DATABASE_URL",
                Some("postgres://localhost/pantry".to_owned()),
            ),
            (
                "FOOD_TRACKER_FOOD_FACTS_BASE_URL",
                Some("http://127.0.0.1:9000/".to_owned()),
            ),
            ("FOOD_TRACKER_REQUEST_TIMEOUT_SECS", Some("2".to_owned())),
            ("FOOD_TRACKER_POLL_INTERVAL_SECS", Some("5".to_owned())),
            ("FOOD_TRACKER_BATCH_SIZE", Some("7".to_owned())),
            ("FOOD_TRACKER_SCHEDULING_ATTEMPTS", Some("1".to_owned())),
            ("FOOD_TRACKER_CONFLICT_POLICY", Some("fail".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), Some("postgres://localhost/pantry"));
        assert_eq!(
            settings.food_facts_base_url().expect("override url").as_str(),
            "http://127.0.0.1:9000/"
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(2));
        assert_eq!(settings.dispatcher_config().poll_interval, Duration::from_secs(5));
        assert_eq!(settings.dispatcher_config().batch_size, 7);
        assert_eq!(
            settings.pantry_config(),
            PantryServiceConfig {
                conflict_policy: ConflictPolicy::Fail,
                scheduling_attempts: 1,
            }
        );
    }

    #[rstest]
    fn blank_database_url_counts_as_missing() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "FOOD_TRACKER_DATABASE_URL").then(|| "  ".to_owned());
            (name, value)
        }));

        assert_eq!(load_from_empty_args().database_url(), None);
    }
}
