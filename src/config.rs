use crate::error::{DripError, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Drip program deployed on mainnet-beta and devnet.
pub const DRIP_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("dripTrkvSyQKvkyWg7oi4jmeEGMA5scSYowHArJ9Vwk");

/// Drip program deployed for the devnet staging environment.
pub const DRIP_STAGING_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("F1NyoZsUhJzcpGyoEqpDNbUMKVvCnSXcCki1nN3ycAeo");

/// Devnet Drip USDT
pub const DEVNET_DRIP_USDT: Pubkey =
    solana_sdk::pubkey!("H9gBUJs5Kc5zyiKRTzZcYom4Hpj9VPHLy4VzExTVPgxa");

pub const DEFAULT_WALLET_ENV: &str = "EXAMPLE_WALLET";

/// Configuration for the Drip client and the example flows
#[derive(Debug, Clone)]
pub struct DripConfig {
    pub network: Network,
    /// Solana JSON-RPC endpoint
    pub rpc_url: Url,
    /// Drip gateway base URL (e.g., "https://api.drip.dcaf.so/v1")
    pub api_url: Url,
    pub program_id: Pubkey,
    /// Commitment used for RPC reads and transaction confirmation
    pub commitment: CommitmentConfig,
    /// Base asset the examples resolve vaults for
    pub token_a_mint: Pubkey,
    /// Deposit size in token A base units
    pub deposit_amount: u64,
    pub number_of_swaps: u64,
    /// Environment variable holding the JSON-encoded wallet secret
    pub wallet_env: String,
    /// HTTP request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Maximum number of retries for idempotent gateway queries
    pub max_retries: u32,
    /// Initial retry delay, doubled on each attempt
    pub retry_delay: Duration,
    /// Upper bound on waiting for a signature to confirm; `None` waits forever
    pub confirmation_timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl DripConfig {
    /// Create a new configuration with the defaults of the given network
    pub fn new(network: Network) -> Result<Self> {
        let rpc_url = Url::parse(network.rpc_url())?;
        let api_url = Url::parse(network.api_url())?;

        Ok(Self {
            program_id: network.program_id(),
            network,
            rpc_url,
            api_url,
            commitment: CommitmentConfig::confirmed(),
            token_a_mint: DEVNET_DRIP_USDT,
            deposit_amount: 100,
            number_of_swaps: 10,
            wallet_env: DEFAULT_WALLET_ENV.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("drip-vault-examples/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            confirmation_timeout: None,
            poll_interval: Duration::from_millis(500),
        })
    }

    /// Create configuration for the devnet staging environment
    pub fn devnet_staging() -> Result<Self> {
        Self::new(Network::DevnetStaging)
    }

    /// Create configuration for devnet
    pub fn devnet() -> Result<Self> {
        Self::new(Network::Devnet)
    }

    /// Create configuration for mainnet-beta
    pub fn mainnet() -> Result<Self> {
        Self::new(Network::Mainnet)
    }

    /// Create configuration for a local validator and gateway
    pub fn local() -> Result<Self> {
        Self::new(Network::Localnet)
    }

    /// Load configuration from an optional TOML file and `DRIP_*` environment
    /// variables, layered over the selected network's defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, "DRIP")
    }

    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Settings) -> Result<Self> {
        let network = match settings.network.as_deref() {
            Some(name) => name.parse()?,
            None => Network::DevnetStaging,
        };
        let mut config = Self::new(network)?;

        if let Some(rpc_url) = settings.rpc_url {
            config = config.with_rpc_url(rpc_url)?;
        }
        if let Some(api_url) = settings.api_url {
            config = config.with_api_url(api_url)?;
        }
        if let Some(program_id) = settings.program_id {
            config.program_id = parse_pubkey("program_id", &program_id)?;
        }
        if let Some(commitment) = settings.commitment {
            config.commitment = CommitmentConfig::from_str(&commitment)
                .map_err(|_| DripError::config(format!("Invalid commitment: {}", commitment)))?;
        }
        if let Some(mint) = settings.token_a_mint {
            config.token_a_mint = parse_pubkey("token_a_mint", &mint)?;
        }
        if let Some(amount) = settings.deposit_amount {
            config.deposit_amount = amount;
        }
        if let Some(swaps) = settings.number_of_swaps {
            config.number_of_swaps = swaps;
        }
        if let Some(wallet_env) = settings.wallet_env {
            config.wallet_env = wallet_env;
        }
        if let Some(secs) = settings.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(max_retries) = settings.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(ms) = settings.retry_delay_ms {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = settings.confirmation_timeout_secs {
            config.confirmation_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the Solana RPC URL
    pub fn with_rpc_url<S: AsRef<str>>(mut self, rpc_url: S) -> Result<Self> {
        self.rpc_url = Url::parse(rpc_url.as_ref())?;
        Ok(self)
    }

    /// Set the gateway URL
    pub fn with_api_url<S: AsRef<str>>(mut self, api_url: S) -> Result<Self> {
        self.api_url = Url::parse(api_url.as_ref())?;
        Ok(self)
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Set the base asset used to resolve vaults
    pub fn with_token_a_mint(mut self, token_a_mint: Pubkey) -> Self {
        self.token_a_mint = token_a_mint;
        self
    }

    /// Set the deposit amount and the number of swaps it is spread over
    pub fn with_deposit(mut self, amount: u64, number_of_swaps: u64) -> Self {
        self.deposit_amount = amount;
        self.number_of_swaps = number_of_swaps;
        self
    }

    pub fn with_wallet_env<S: Into<String>>(mut self, wallet_env: S) -> Self {
        self.wallet_env = wallet_env.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retry delay
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Get the full gateway URL for a given path
    pub fn api_url(&self, path: &str) -> String {
        let mut url = self.api_url.clone();
        let current_path = url.path().trim_end_matches('/');
        let new_path = format!("{}/{}", current_path, path.trim_start_matches('/'));
        url.set_path(&new_path);
        url.to_string()
    }
}

/// Cluster plus Drip deployment a client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Devnet,
    DevnetStaging,
    Localnet,
    Custom { rpc_url: String, api_url: String },
}

impl Network {
    pub fn rpc_url(&self) -> &str {
        match self {
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Devnet | Network::DevnetStaging => "https://api.devnet.solana.com",
            Network::Localnet => "http://127.0.0.1:8899",
            Network::Custom { rpc_url, .. } => rpc_url,
        }
    }

    pub fn api_url(&self) -> &str {
        match self {
            Network::Mainnet => "https://api.drip.dcaf.so/v1",
            Network::Devnet => "https://devnet.api.drip.dcaf.so/v1",
            Network::DevnetStaging => "https://devnet-staging.api.drip.dcaf.so/v1",
            Network::Localnet => "http://localhost:8080/v1",
            Network::Custom { api_url, .. } => api_url,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        match self {
            Network::DevnetStaging | Network::Localnet => DRIP_STAGING_PROGRAM_ID,
            _ => DRIP_PROGRAM_ID,
        }
    }
}

impl FromStr for Network {
    type Err = DripError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            "devnet-staging" | "devnet_staging" | "devnetstaging" => Ok(Network::DevnetStaging),
            "localnet" | "local" => Ok(Network::Localnet),
            other => Err(DripError::config(format!("Unknown network: {}", other))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    network: Option<String>,
    rpc_url: Option<String>,
    api_url: Option<String>,
    program_id: Option<String>,
    commitment: Option<String>,
    token_a_mint: Option<String>,
    deposit_amount: Option<u64>,
    number_of_swaps: Option<u64>,
    wallet_env: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    confirmation_timeout_secs: Option<u64>,
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| DripError::config(format!("Invalid {} '{}': {}", field, value, e)))
}
