use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "random-people")]
#[command(about = "Fetch random people through two HTTP clients and compare their latency")]
pub struct CliConfig {
    #[arg(long, short, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Where timing samples are persisted")]
    pub storage_path: Option<String>,

    #[arg(long, help = "Pause before the busy indicator clears, in milliseconds")]
    pub settle_delay_ms: Option<u64>,

    #[arg(long, help = "Initial two-letter country filter")]
    pub country: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the TOML file (or defaults), applies flag overrides and validates.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(path) = &self.storage_path {
            config.storage.path = path.clone();
        }
        if let Some(delay) = self.settle_delay_ms {
            config.coordinator.settle_delay_ms = delay;
        }
        if let Some(country) = &self.country {
            config.request.default_country = country.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
