//! Runtime settings loaded via OrthoConfig.
//!
//! Values come from `LUNCHBOX_*` environment variables, an optional config
//! file, and command-line flags, in increasing precedence.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{Nickname, PostingWindow};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_UTC_OFFSET: &str = "+09:00";
const DEFAULT_WINDOW_START: &str = "11:00";
const DEFAULT_WINDOW_END: &str = "14:00";
const DEFAULT_ADMIN_NICKNAME: &str = "admin";
const DEFAULT_BLOB_ROOT: &str = "blobs";

/// Errors raised while interpreting settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required value was not provided.
    #[error("missing setting: {name}")]
    Missing { name: &'static str },
    /// A value could not be parsed.
    #[error("invalid {name} {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Settings shared by the admin CLI and embedding applications.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LUNCHBOX")]
pub struct LunchboxSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds a command waits for a free connection.
    pub pool_checkout_timeout_secs: Option<u64>,
    /// Directory holding post images.
    pub blob_root: Option<PathBuf>,
    /// Offset of the app's local day, e.g. `+09:00`.
    pub utc_offset: Option<String>,
    /// Local time posting opens, `HH:MM`.
    pub posting_window_start: Option<String>,
    /// Local time posting closes, `HH:MM`.
    pub posting_window_end: Option<String>,
    /// Accept posts at any time of day.
    #[ortho_config(default = false)]
    pub posting_window_disabled: bool,
    /// Nickname of the administrator account.
    pub admin_nickname: Option<String>,
    /// Password used when bootstrapping the administrator.
    pub admin_password: Option<String>,
}

fn parse_time(name: &'static str, value: &str) -> Result<NaiveTime, SettingsError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|err| SettingsError::invalid(name, value, err))
}

impl LunchboxSettings {
    /// Database connection string.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .ok_or(SettingsError::Missing {
                name: "database_url",
            })
    }

    /// Pool configuration built from the database settings.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when no database URL is set.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let mut config = PoolConfig::new(self.database_url()?);
        if let Some(max_size) = self.pool_max_size {
            config = config.with_max_connections(max_size);
        }
        if let Some(secs) = self.pool_checkout_timeout_secs {
            config = config.with_checkout_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Blob directory, `blobs` when unset.
    pub fn blob_root(&self) -> PathBuf {
        self.blob_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BLOB_ROOT))
    }

    /// Offset defining the local day.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Invalid`] when the value is not `±HH:MM`.
    pub fn utc_offset(&self) -> Result<FixedOffset, SettingsError> {
        let raw = self.utc_offset.as_deref().unwrap_or(DEFAULT_UTC_OFFSET);
        raw.parse::<FixedOffset>()
            .map_err(|err| SettingsError::invalid("utc_offset", raw, err))
    }

    /// Posting window in the configured offset.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Invalid`] for malformed times or offset.
    pub fn posting_window(&self) -> Result<PostingWindow, SettingsError> {
        let offset = self.utc_offset()?;
        if self.posting_window_disabled {
            return Ok(PostingWindow::always_open(offset));
        }
        let start = parse_time(
            "posting_window_start",
            self.posting_window_start
                .as_deref()
                .unwrap_or(DEFAULT_WINDOW_START),
        )?;
        let end = parse_time(
            "posting_window_end",
            self.posting_window_end
                .as_deref()
                .unwrap_or(DEFAULT_WINDOW_END),
        )?;
        Ok(PostingWindow::new(start, end, offset))
    }

    /// Administrator nickname, `admin` when unset.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Invalid`] when the nickname fails validation.
    pub fn admin_nickname(&self) -> Result<Nickname, SettingsError> {
        let raw = self
            .admin_nickname
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_NICKNAME);
        Nickname::new(raw).map_err(|err| SettingsError::invalid("admin_nickname", raw, err))
    }

    /// Administrator bootstrap password.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset.
    pub fn admin_password(&self) -> Result<&str, SettingsError> {
        self.admin_password
            .as_deref()
            .ok_or(SettingsError::Missing {
                name: "admin_password",
            })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use chrono::{TimeZone, Utc};
    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "LUNCHBOX_DATABASE_URL",
        "LUNCHBOX_POOL_MAX_SIZE",
        "LUNCHBOX_POOL_CHECKOUT_TIMEOUT_SECS",
        "LUNCHBOX_BLOB_ROOT",
        "LUNCHBOX_UTC_OFFSET",
        "LUNCHBOX_POSTING_WINDOW_START",
        "LUNCHBOX_POSTING_WINDOW_END",
        "LUNCHBOX_POSTING_WINDOW_DISABLED",
        "LUNCHBOX_ADMIN_NICKNAME",
        "LUNCHBOX_ADMIN_PASSWORD",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> LunchboxSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        LunchboxSettings::load_from_iter([OsString::from("lunchbox-admin")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[]);

        assert_eq!(
            settings.database_url(),
            Err(SettingsError::Missing {
                name: "database_url"
            })
        );
        assert_eq!(settings.blob_root(), PathBuf::from("blobs"));
        assert_eq!(
            settings.utc_offset().expect("offset"),
            FixedOffset::east_opt(9 * 3600).expect("valid offset")
        );
        assert_eq!(settings.admin_nickname().expect("nickname").as_ref(), "admin");
        assert!(settings.admin_password().is_err());
    }

    #[rstest]
    fn default_window_is_eleven_to_two_local() {
        let window = load_with(&[]).posting_window().expect("window");

        let noon_tokyo = Utc.with_ymd_and_hms(2026, 4, 1, 3, 0, 0).single().expect("time");
        let evening_tokyo = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).single().expect("time");
        assert!(window.is_open_at(noon_tokyo));
        assert!(!window.is_open_at(evening_tokyo));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("LUNCHBOX_DATABASE_URL", "postgres://db/lunch"),
            ("LUNCHBOX_POOL_MAX_SIZE", "2"),
            ("LUNCHBOX_POOL_CHECKOUT_TIMEOUT_SECS", "3"),
            ("LUNCHBOX_UTC_OFFSET", "+00:00"),
            ("LUNCHBOX_POSTING_WINDOW_DISABLED", "true"),
            ("LUNCHBOX_ADMIN_NICKNAME", "root"),
            ("LUNCHBOX_ADMIN_PASSWORD", "s3cret"),
        ]);

        let pool = settings.pool_config().expect("pool config");
        assert_eq!(pool.database_url(), "postgres://db/lunch");
        assert_eq!(pool.max_connections(), 2);
        assert_eq!(pool.checkout_timeout(), Duration::from_secs(3));
        assert_eq!(settings.admin_nickname().expect("nickname").as_ref(), "root");
        assert_eq!(settings.admin_password(), Ok("s3cret"));
        let midnight = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).single().expect("time");
        assert!(settings.posting_window().expect("window").is_open_at(midnight));
    }

    #[rstest]
    #[case("LUNCHBOX_UTC_OFFSET", "JST", "utc_offset")]
    #[case("LUNCHBOX_POSTING_WINDOW_START", "noon", "posting_window_start")]
    #[case("LUNCHBOX_POSTING_WINDOW_END", "25:00", "posting_window_end")]
    fn malformed_values_are_reported(
        #[case] var: &str,
        #[case] value: &str,
        #[case] expected_name: &str,
    ) {
        let settings = load_with(&[(var, value)]);

        let err = settings.posting_window().expect_err("invalid value");
        assert!(
            matches!(&err, SettingsError::Invalid { name, .. } if *name == expected_name),
            "unexpected error: {err}"
        );
    }
}
