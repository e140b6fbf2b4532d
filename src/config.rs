//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::email::EmailConfig;
use crate::error::ConfigError;

/// Timing of the registration wizard's simulated calls.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Simulated OTP verification latency.
    pub otp_delay: Duration,
    /// Simulated payment latency.
    pub payment_delay: Duration,
    /// Countdown before "resend OTP" unlocks.
    pub resend_window: Duration,
    /// Sessions untouched for this long are evicted.
    pub session_idle_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            otp_delay: Duration::from_millis(1000),
            payment_delay: Duration::from_millis(2000),
            resend_window: Duration::from_secs(60),
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Whole-service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    /// libSQL file for preferences; in-memory when unset.
    pub prefs_db: Option<PathBuf>,
    pub wizard: WizardConfig,
    pub email: EmailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            prefs_db: None,
            wizard: WizardConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

/// Parse `key` if present; absent or empty means `default`.
pub(crate) fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let wizard_defaults = WizardConfig::default();

        let otp_ms = parse_or(&get, "JANAPADA_OTP_DELAY_MS", wizard_defaults.otp_delay.as_millis() as u64)?;
        let payment_ms = parse_or(
            &get,
            "JANAPADA_PAYMENT_DELAY_MS",
            wizard_defaults.payment_delay.as_millis() as u64,
        )?;
        let resend_secs = parse_or(&get, "JANAPADA_RESEND_SECS", wizard_defaults.resend_window.as_secs())?;
        let idle_secs = parse_or(
            &get,
            "JANAPADA_SESSION_IDLE_SECS",
            wizard_defaults.session_idle_timeout.as_secs(),
        )?;
        if idle_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JANAPADA_SESSION_IDLE_SECS".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }

        let config = Self {
            bind: get("JANAPADA_BIND")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.bind),
            port: parse_or(&get, "JANAPADA_PORT", defaults.port)?,
            prefs_db: get("JANAPADA_PREFS_DB")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            wizard: WizardConfig {
                otp_delay: Duration::from_millis(otp_ms),
                payment_delay: Duration::from_millis(payment_ms),
                resend_window: Duration::from_secs(resend_secs),
                session_idle_timeout: Duration::from_secs(idle_secs),
            },
            email: EmailConfig::from_lookup(&get)?,
        };
        config.socket_addr()?;
        Ok(config)
    }

    /// Address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "JANAPADA_BIND".to_string(),
                message: format!("{:?}: {e}", self.bind),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind, "0.0.0.0");
        assert!(config.prefs_db.is_none());
        assert_eq!(config.wizard.otp_delay, Duration::from_millis(1000));
        assert_eq!(config.wizard.payment_delay, Duration::from_millis(2000));
        assert_eq!(config.wizard.resend_window, Duration::from_secs(60));
        assert!(config.email.is_development());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JANAPADA_PORT", "8081"),
            ("JANAPADA_BIND", "127.0.0.1"),
            ("JANAPADA_PREFS_DB", "/tmp/prefs.db"),
            ("JANAPADA_OTP_DELAY_MS", "5"),
            ("JANAPADA_PAYMENT_DELAY_MS", "7"),
            ("JANAPADA_RESEND_SECS", "30"),
            ("RESEND_API_KEY", "re_live"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8081");
        assert_eq!(config.prefs_db, Some(PathBuf::from("/tmp/prefs.db")));
        assert_eq!(config.wizard.otp_delay, Duration::from_millis(5));
        assert_eq!(config.wizard.payment_delay, Duration::from_millis(7));
        assert_eq!(config.wizard.resend_window, Duration::from_secs(30));
        assert!(!config.email.is_development());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("JANAPADA_OTP_DELAY_MS", "soon")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "JANAPADA_OTP_DELAY_MS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn session_idle_timeout_is_configurable() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.wizard.session_idle_timeout, Duration::from_secs(1800));

        let config = AppConfig::from_lookup(lookup(&[("JANAPADA_SESSION_IDLE_SECS", "90")])).unwrap();
        assert_eq!(config.wizard.session_idle_timeout, Duration::from_secs(90));

        let err = AppConfig::from_lookup(lookup(&[("JANAPADA_SESSION_IDLE_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "JANAPADA_SESSION_IDLE_SECS"));
    }

    #[test]
    fn invalid_smtp_port_fails_app_config() {
        let err = AppConfig::from_lookup(lookup(&[
            ("EMAIL_SMTP_HOST", "smtp.example.com"),
            ("EMAIL_SMTP_PORT", "70000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "EMAIL_SMTP_PORT"));
    }

    #[test]
    fn invalid_bind_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("JANAPADA_BIND", "not an ip")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
