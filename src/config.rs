use {
    crate::domain::id::TRANSACTION_PREFIX,
    crate::services::link_service::LinkSettings,
    std::{env, str::FromStr, time::Duration},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AcledaConfig {
    pub open_session_url: String,
    pub base_url: String,
    pub login: String,
    pub password: String,
    pub merchant_id: String,
    pub secret: String,
    pub timeout: Duration,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_addr: String,
    pub database_url: Option<String>,
    pub amqp_url: Option<String>,
    pub acleda: AcledaConfig,
    pub link_expiry_minutes: i32,
    pub job_queue_capacity: usize,
    pub job_retention: usize,
    pub audit_buffer: usize,
}

impl Config {
    /// Loads `.env` if present, then reads the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            app_addr: optional("APP_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            database_url: optional("DATABASE_URL"),
            amqp_url: optional("AMQP_URL"),
            acleda: AcledaConfig {
                open_session_url: required("ACLEDA_OPEN_SESSION_URL")?,
                base_url: required("ACLEDA_BASE_URL")?,
                login: required("ACLEDA_LOGIN")?,
                password: required("ACLEDA_PASSWORD")?,
                merchant_id: required("ACLEDA_MERCHANT_ID")?,
                secret: required("ACLEDA_SECRET")?,
                timeout: Duration::from_millis(parse_or(&get, "ACLEDA_TIMEOUT_MS", 30_000)?),
            },
            link_expiry_minutes: parse_or(&get, "LINK_EXPIRY_MINUTES", 60)?,
            job_queue_capacity: parse_or(&get, "JOB_QUEUE_CAPACITY", 100)?,
            job_retention: parse_or(&get, "JOB_RETENTION", 10_000)?,
            audit_buffer: parse_or(&get, "AUDIT_BUFFER", 1024)?,
        })
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            login: self.acleda.login.clone(),
            password: self.acleda.password.clone(),
            merchant_id: self.acleda.merchant_id.clone(),
            signature: self.acleda.secret.clone(),
            base_url: self.acleda.base_url.clone(),
            default_expiry_minutes: self.link_expiry_minutes,
            prefix: TRANSACTION_PREFIX.to_string(),
        }
    }
}

/// Positive number or the default when unset.
fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = get(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
