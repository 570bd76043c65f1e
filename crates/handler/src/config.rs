use std::time::Duration;

use nodesweep_core::error::CoreError;

/// Default node attribute used to tag nodes and pin cleanup jobs.
pub const DEFAULT_PLACEMENT_ATTRIBUTE: &str = "instanceId";

/// Default callback request timeout in seconds.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CoreError::Validation(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Handler configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Attribute name written on each active node and matched by the
    /// cleanup job's placement constraint.
    pub placement_attribute: String,
    /// Timeout of the callback `PUT`.
    pub callback_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            placement_attribute: DEFAULT_PLACEMENT_ATTRIBUTE.to_string(),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
            log_format: LogFormat::Text,
        }
    }
}

impl HandlerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default      |
    /// |-------------------------|--------------|
    /// | `PLACEMENT_ATTRIBUTE`   | `instanceId` |
    /// | `CALLBACK_TIMEOUT_SECS` | `30`         |
    /// | `LOG_FORMAT`            | `text`       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let placement_attribute = match lookup("PLACEMENT_ATTRIBUTE") {
            Some(value) => validate_attribute_name(value.trim())?.to_string(),
            None => defaults.placement_attribute,
        };

        let callback_timeout = match lookup("CALLBACK_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|_| {
                    CoreError::Validation(format!(
                        "CALLBACK_TIMEOUT_SECS must be a positive integer, got '{value}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(CoreError::Validation(
                        "CALLBACK_TIMEOUT_SECS must be greater than zero".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.callback_timeout,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value)?,
            None => defaults.log_format,
        };

        Ok(Self {
            placement_attribute,
            callback_timeout,
            log_format,
        })
    }
}

/// ECS attribute names: 1-128 letters, digits, hyphens, underscores,
/// periods, at signs, or forward slashes.
fn validate_attribute_name(name: &str) -> Result<&str, CoreError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/'));
    if valid {
        Ok(name)
    } else {
        Err(CoreError::Validation(format!(
            "PLACEMENT_ATTRIBUTE '{name}' is not a valid attribute name"
        )))
    }
}
