use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::config::Credentials;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },
}

/// Application settings, read from `LMS_*` environment variables.
///
/// | Variable | Default |
/// |---|---|
/// | `LMS_REGION` | `us-east-1` |
/// | `LMS_ACCESS_KEY_ID`, `LMS_SECRET_ACCESS_KEY` | SDK credential chain |
/// | `LMS_ENDPOINT_URL` | AWS endpoint |
/// | `LMS_LOG_LEVEL` | `info` |
/// | `LMS_USER_TABLE`, `LMS_USER_KEY` | `User`, `UserId` |
/// | `LMS_COURSE_TABLE`, `LMS_COURSE_KEY` | `Course`, `CourseId` |
/// | `LMS_USER_COURSE_TABLE`, `LMS_USER_COURSE_KEY` | `UserCourse`, `UserCourseId` |
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Points the client at DynamoDB Local or another compatible endpoint.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_user_table")]
    pub user_table: String,
    #[serde(default = "default_user_key")]
    pub user_key: String,
    #[serde(default = "default_course_table")]
    pub course_table: String,
    #[serde(default = "default_course_key")]
    pub course_key: String,
    #[serde(default = "default_user_course_table")]
    pub user_course_table: String,
    #[serde(default = "default_user_course_key")]
    pub user_course_key: String,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_source(::config::Environment::with_prefix("LMS"))
    }

    fn from_source(source: ::config::Environment) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(source)
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load configuration: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize configuration: {}", e),
            })
    }

    /// Static credentials, when both halves of the key pair are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials::new(id, secret, None, None, "elms-config")),
            _ => None,
        }
    }

    /// Builds the SDK configuration the repository factory connects with.
    pub async fn sdk_config(&self) -> SdkConfig {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));

        if let Some(credentials) = self.credentials() {
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }
}

pub(crate) fn default_region() -> String {
    "us-east-1".to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

pub(crate) fn default_user_table() -> String {
    "User".to_string()
}

pub(crate) fn default_user_key() -> String {
    "UserId".to_string()
}

pub(crate) fn default_course_table() -> String {
    "Course".to_string()
}

pub(crate) fn default_course_key() -> String {
    "CourseId".to_string()
}

pub(crate) fn default_user_course_table() -> String {
    "UserCourse".to_string()
}

pub(crate) fn default_user_course_key() -> String {
    "UserCourseId".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(::config::Environment::with_prefix("LMS").source(Some(source)))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.user_table, "User");
        assert_eq!(config.course_key, "CourseId");
        assert_eq!(config.user_course_table, "UserCourse");
        assert!(config.endpoint_url.is_none());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_prefixed_variables_override_defaults() {
        let config = load(&[
            ("LMS_REGION", "eu-west-1"),
            ("LMS_USER_TABLE", "Users"),
            ("LMS_ENDPOINT_URL", "http://localhost:8000"),
            ("OTHER_REGION", "ignored"),
        ]);
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.user_table, "Users");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let config = load(&[("LMS_ACCESS_KEY_ID", "AKIDEXAMPLE")]);
        assert!(config.credentials().is_none());

        let config = load(&[
            ("LMS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("LMS_SECRET_ACCESS_KEY", "secret"),
        ]);
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
    }
}
