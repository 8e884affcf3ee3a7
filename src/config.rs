// Runtime configuration: defaults, optional catcraft.toml, .env and CATCRAFT_* variables

use crate::core::{Hash256, Network};
use crate::error::{Error, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, Map};
use serde::Deserialize;

/// Connection settings for the bitcoind JSON-RPC interface
#[derive(Debug, Clone, Deserialize)]
pub struct BitcoindConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Path to bitcoind's `.cookie` file, used when user/pass are unset
    pub cookie_file: Option<String>,
}

impl BitcoindConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// RPC user and password, from explicit settings or the cookie file
    pub fn credentials(&self) -> Result<(String, String)> {
        if let (Some(user), Some(pass)) = (&self.user, &self.pass) {
            return Ok((user.clone(), pass.clone()));
        }

        let path = self.cookie_file.as_ref().ok_or_else(|| {
            Error::Config(
                "bitcoind credentials missing: set CATCRAFT_BITCOIND__USER and \
                 CATCRAFT_BITCOIND__PASS, or CATCRAFT_BITCOIND__COOKIE_FILE"
                    .to_string(),
            )
        })?;

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read cookie file {}: {}", path, e)))?;
        let (user, pass) = contents
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::Config(format!("Cookie file {} is not user:pass", path)))?;

        Ok((user.to_string(), pass.to_string()))
    }
}

/// Amounts and polling for a game round
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Value locked in the game output
    pub amount_sat: u64,
    pub fee_sat: u64,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub network: Network,
    pub bitcoind: BitcoindConfig,
    pub explorer_url: String,
    pub game: GameConfig,
}

impl AppConfig {
    /// Load from `.env`, `catcraft.toml` (optional) and the environment
    pub fn load() -> Result<Self> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();
        Self::build(Some("catcraft"), None)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self> {
        Self::build(None, Some(Map::new()))
    }

    /// Defaults overridden by the given `CATCRAFT_*` variables only
    pub fn from_env_map(vars: Map<String, String>) -> Result<Self> {
        Self::build(None, Some(vars))
    }

    fn build(file: Option<&str>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Self::with_defaults()?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        // CATCRAFT_BITCOIND__USER -> bitcoind.user
        let config = builder
            .add_source(
                Environment::with_prefix("CATCRAFT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("network", "testnet")?
            // bitcoind defaults
            .set_default("bitcoind.host", "localhost")?
            .set_default("bitcoind.port", 8332)?
            .set_default("bitcoind.user", Option::<String>::None)?
            .set_default("bitcoind.pass", Option::<String>::None)?
            .set_default("bitcoind.cookie_file", Option::<String>::None)?
            .set_default("explorer_url", "https://catnet-mempool.btcwild.life/")?
            // Game defaults
            .set_default("game.amount_sat", 100_000)?
            .set_default("game.fee_sat", 1_000)?
            .set_default("game.poll_interval_secs", 10)?
            .set_default("game.poll_timeout_secs", 600)?)
    }

    /// Check cross-field constraints; rerun after changing fields in place
    pub fn validate(&self) -> Result<()> {
        if self.game.fee_sat >= self.game.amount_sat {
            return Err(Error::Config(format!(
                "Fee {} sat must be below the game amount {} sat",
                self.game.fee_sat, self.game.amount_sat
            )));
        }
        if self.game.poll_interval_secs == 0 {
            return Err(Error::Config("Poll interval cannot be zero".to_string()));
        }
        if self.bitcoind.host.is_empty() {
            return Err(Error::Config("bitcoind host cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Explorer page of a transaction
    pub fn tx_url(&self, txid: &Hash256) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), txid)
    }

    /// Explorer page of an address
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), address)
    }
}
