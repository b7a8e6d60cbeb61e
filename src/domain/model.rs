use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_RESULT_COUNT: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unspecified,
    Male,
    Female,
}

impl Gender {
    /// Value sent in the `gender` query parameter.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Gender::Unspecified => "",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "unspecified" => Ok(Gender::Unspecified),
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(AppError::InvalidConfigValueError {
                field: "gender".to_string(),
                value: other.to_string(),
                reason: "expected any, male or female".to_string(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Unspecified => write!(f, "any"),
            other => write!(f, "{}", other.as_query_value()),
        }
    }
}

/// Filters for one people request. A copy is taken when an operation is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    pub gender: Gender,
    pub country_code: String,
    pub result_count: u32,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            gender: Gender::Unspecified,
            country_code: DEFAULT_COUNTRY.to_string(),
            result_count: DEFAULT_RESULT_COUNT,
        }
    }
}

impl RequestParameters {
    pub fn with_country(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            ..Self::default()
        }
    }

    /// `base?results=N&gender=G&nat=CC`, identical for both strategies.
    pub fn to_url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base)?;
        url.query_pairs_mut()
            .append_pair("results", &self.result_count.to_string())
            .append_pair("gender", self.gender.as_query_value())
            .append_pair("nat", &self.country_code);
        Ok(url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyId {
    /// Client-managed: status errors raised by the client, body decoded by it.
    Typed,
    /// Manual: status checked by hand, body read as text and decoded separately.
    Raw,
}

impl StrategyId {
    pub const ALL: [StrategyId; 2] = [StrategyId::Typed, StrategyId::Raw];

    pub fn storage_key(&self) -> &'static str {
        match self {
            StrategyId::Typed => "axiosTime",
            StrategyId::Raw => "fetchTime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyId::Typed => "typed client",
            StrategyId::Raw => "raw client",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationMode {
    StrategyA,
    StrategyB,
    Comparison,
    AuxiliaryFetch,
}

impl OperationMode {
    /// Strategies whose result slots this mode owns. Empty for the auxiliary fetch.
    pub fn strategies(&self) -> &'static [StrategyId] {
        match self {
            OperationMode::StrategyA => &[StrategyId::Typed],
            OperationMode::StrategyB => &[StrategyId::Raw],
            OperationMode::Comparison => &StrategyId::ALL,
            OperationMode::AuxiliaryFetch => &[],
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationMode::StrategyA => "strategy A",
            OperationMode::StrategyB => "strategy B",
            OperationMode::Comparison => "comparison",
            OperationMode::AuxiliaryFetch => "user directory",
        };
        f.write_str(name)
    }
}

/// Record from the random-user service, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Person(pub serde_json::Value);

impl Person {
    pub fn uuid(&self) -> Option<&str> {
        self.0.pointer("/login/uuid").and_then(|v| v.as_str())
    }

    pub fn display_name(&self) -> String {
        let first = self.0.pointer("/name/first").and_then(|v| v.as_str());
        let last = self.0.pointer("/name/last").and_then(|v| v.as_str());
        match (first, last) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(n), None) | (None, Some(n)) => n.to_string(),
            (None, None) => self.uuid().unwrap_or("unknown").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeoplePage {
    pub results: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub image: String,
    pub address: Address,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    pub strategy: StrategyId,
    pub duration_millis: f64,
}

/// Everything the presentation layer reads. Owned by the coordinator; callers get clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorState {
    pub is_busy: bool,
    pub active_mode: Option<OperationMode>,
    pub results_by_strategy: BTreeMap<StrategyId, Vec<Person>>,
    pub auxiliary_users: Vec<User>,
    pub timings: BTreeMap<StrategyId, f64>,
}

impl CoordinatorState {
    pub fn people(&self, strategy: StrategyId) -> &[Person] {
        self.results_by_strategy
            .get(&strategy)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn timing(&self, strategy: StrategyId) -> f64 {
        self.timings.get(&strategy).copied().unwrap_or(0.0)
    }

    pub fn is_loading(&self, mode: OperationMode) -> bool {
        self.is_busy && self.active_mode == Some(mode)
    }

    /// Marks the state busy and clears the slots owned by `mode`.
    pub(crate) fn begin(&mut self, mode: OperationMode) {
        self.is_busy = true;
        self.active_mode = Some(mode);
        match mode {
            OperationMode::AuxiliaryFetch => self.auxiliary_users.clear(),
            people_mode => {
                for strategy in people_mode.strategies() {
                    self.results_by_strategy.insert(*strategy, Vec::new());
                }
            }
        }
    }

    pub(crate) fn settle(&mut self) {
        self.is_busy = false;
        self.active_mode = None;
    }
}
