use crate::core::coordinator::DEFAULT_SETTLE_DELAY;
use crate::domain::model::{RequestParameters, DEFAULT_COUNTRY, DEFAULT_RESULT_COUNT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PEOPLE_ENDPOINT: &str = "https://randomuser.me/api/";
pub const DEFAULT_USERS_ENDPOINT: &str = "https://dummyjson.com/users";
pub const DEFAULT_STORAGE_PATH: &str = "./.random-people/timings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoints: EndpointsConfig,
    pub request: RequestConfig,
    pub coordinator: CoordinatorConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub people: String,
    pub users: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            people: DEFAULT_PEOPLE_ENDPOINT.to_string(),
            users: DEFAULT_USERS_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub default_country: String,
    pub result_count: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_country: DEFAULT_COUNTRY.to_string(),
            result_count: DEFAULT_RESULT_COUNT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub settle_delay_ms: u64,
    pub time_single_runs: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            time_single_runs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORAGE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
}

impl AppConfig {
    /// Loads and parses a TOML file. Missing sections fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("endpoints.people", &self.endpoints.people)?;
        validation::validate_url("endpoints.users", &self.endpoints.users)?;
        validation::validate_country_code("request.default_country", &self.request.default_country)?;
        validation::validate_range("request.result_count", self.request.result_count, 1, 5000)?;
        validation::validate_path("storage.path", &self.storage.path)?;

        if let Some(timeout) = self.http.timeout_seconds {
            validation::validate_range("http.timeout_seconds", timeout, 1, 600)?;
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn people_endpoint(&self) -> &str {
        &self.endpoints.people
    }

    fn users_endpoint(&self) -> &str {
        &self.endpoints.users
    }

    fn default_parameters(&self) -> RequestParameters {
        RequestParameters {
            country_code: self.request.default_country.to_ascii_uppercase(),
            result_count: self.request.result_count,
            ..RequestParameters::default()
        }
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.coordinator.settle_delay_ms)
    }

    fn time_single_runs(&self) -> bool {
        self.coordinator.time_single_runs
    }

    fn storage_path(&self) -> &str {
        &self.storage.path
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.http.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
