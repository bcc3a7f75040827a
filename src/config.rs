use crate::constants::{
    DEFAULT_ARTIFACT_FILE, DEFAULT_BASE_URL, DEFAULT_LANDING_URL, DEFAULT_LOGIN_URL,
    DEFAULT_NAV_TIMEOUT_SECS, DEFAULT_OTP_WAIT_SECS, DEFAULT_PROFILE_API_URL,
    DEFAULT_SETTLE_SECS,
};
use crate::error::CheckInError;
use crate::otp;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, warn};

/// Login identity plus the shared TOTP secret. Loaded once at startup,
/// immutable for the process lifetime, never logged in plaintext.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub(crate) password: String,
    pub(crate) totp_secret: String,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub login_url: String,
    pub landing_url: String,
    pub profile_api_url: String,
    pub nav_timeout_secs: u64,
    pub otp_wait_secs: u64,
    pub settle_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub artifact_path: PathBuf,
}

/// Daily trigger window and pre-run jitter, both inclusive of the lower
/// bound. The window end hour is exclusive: 9..12 means 09:00-11:59.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub window_start_hour: u32,
    pub window_end_hour: u32,
    pub jitter_min_secs: u64,
    pub jitter_max_secs: u64,
}

#[derive(Debug, Clone)]
pub enum NotifyConfig {
    Telegram { bot_token: String, chat_id: String },
    None,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub site: SiteConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub notify: NotifyConfig,
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"username\":\"{}\",\"password\":\"[REDACTED]\",\"totp_secret\":\"[REDACTED]\"}}",
            self.username
        )
    }
}

impl fmt::Display for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"login_url\":\"{}\",\"landing_url\":\"{}\",\"profile_api_url\":\"{}\",\"nav_timeout_secs\":{},\"otp_wait_secs\":{},\"settle_secs\":{}}}",
            self.base_url,
            self.login_url,
            self.landing_url,
            self.profile_api_url,
            self.nav_timeout_secs,
            self.otp_wait_secs,
            self.settle_secs
        )
    }
}

impl fmt::Display for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyConfig::Telegram { chat_id, .. } => write!(
                f,
                "{{\"type\":\"telegram\",\"bot_token\":\"[REDACTED]\",\"chat_id\":\"{chat_id}\"}}"
            ),
            NotifyConfig::None => write!(f, "{{\"type\":\"none\"}}"),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"credentials\":{},\"site\":{},\"artifact_path\":\"{}\",\"notify\":{}}}",
            self.credentials,
            self.site,
            self.storage.artifact_path.display(),
            self.notify
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

fn required_env(env_var: &str) -> Result<String, CheckInError> {
    env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CheckInError::Configuration(format!("{env_var} is not set")))
}

impl Config {
    /// Builds the configuration from environment variables.
    ///
    /// Missing credentials or an unusable TOTP secret are startup-fatal,
    /// never a runtime retry condition. Tunables fall back to their
    /// defaults when absent or unparseable.
    pub fn from_env() -> Result<Self, CheckInError> {
        let credentials = Credentials {
            username: required_env("MT_USERNAME")?,
            password: required_env("MT_PASSWORD")?,
            totp_secret: required_env("MT_TOTP_SECRET")?,
        };

        otp::validate_secret(&credentials.totp_secret)
            .map_err(|e| CheckInError::Configuration(format!("MT_TOTP_SECRET: {e}")))?;

        let site = SiteConfig {
            base_url: get_env_or_default("MT_BASE_URL", String::from(DEFAULT_BASE_URL)),
            login_url: get_env_or_default("MT_LOGIN_URL", String::from(DEFAULT_LOGIN_URL)),
            landing_url: get_env_or_default("MT_LANDING_URL", String::from(DEFAULT_LANDING_URL)),
            profile_api_url: get_env_or_default(
                "MT_PROFILE_API_URL",
                String::from(DEFAULT_PROFILE_API_URL),
            ),
            nav_timeout_secs: get_env_or_default("MT_NAV_TIMEOUT", DEFAULT_NAV_TIMEOUT_SECS),
            otp_wait_secs: get_env_or_default("MT_OTP_WAIT", DEFAULT_OTP_WAIT_SECS),
            settle_secs: get_env_or_default("MT_SETTLE_DELAY", DEFAULT_SETTLE_SECS),
        };

        let storage = StorageConfig {
            artifact_path: PathBuf::from(get_env_or_default(
                "MT_SESSION_FILE",
                String::from(DEFAULT_ARTIFACT_FILE),
            )),
        };

        let schedule = ScheduleConfig {
            window_start_hour: get_env_or_default("MT_WINDOW_START_HOUR", 9),
            window_end_hour: get_env_or_default("MT_WINDOW_END_HOUR", 12),
            jitter_min_secs: get_env_or_default("MT_JITTER_MIN", 10),
            jitter_max_secs: get_env_or_default("MT_JITTER_MAX", 300),
        }
        .validated()?;

        let notify = match get_env_or_default("NOTIFY_TYPE", String::from("none")).as_str() {
            "telegram" => NotifyConfig::Telegram {
                bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
                chat_id: required_env("TELEGRAM_CHAT_ID")?,
            },
            "none" => {
                warn!("NOTIFY_TYPE is 'none', no notifications will be sent");
                NotifyConfig::None
            }
            other => {
                return Err(CheckInError::Configuration(format!(
                    "NOTIFY_TYPE must be 'telegram' or 'none', got '{other}'"
                )))
            }
        };

        Ok(Config {
            credentials,
            site,
            storage,
            schedule,
            notify,
        })
    }
}

impl ScheduleConfig {
    fn validated(self) -> Result<Self, CheckInError> {
        if self.window_start_hour >= self.window_end_hour || self.window_end_hour > 24 {
            return Err(CheckInError::Configuration(format!(
                "check-in window {}..{} is not a valid hour range",
                self.window_start_hour, self.window_end_hour
            )));
        }
        if self.jitter_min_secs > self.jitter_max_secs {
            return Err(CheckInError::Configuration(format!(
                "jitter bounds {}..{} are inverted",
                self.jitter_min_secs, self.jitter_max_secs
            )));
        }
        Ok(self)
    }
}
