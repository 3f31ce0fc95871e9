pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod report;
pub mod resolver;
pub mod serde_utils;
pub mod types;
pub mod vault;
pub mod wallet;

// Re-export main types for convenience
pub use api::DripApi;
pub use client::{DripClient, DripClientBuilder};
pub use config::{DripConfig, Network};
pub use error::{DripError, ErrorKind, Result};
pub use report::Reporter;
pub use resolver::{ResolvedVault, SelectionPolicy, VaultResolver};
pub use types::*;
pub use vault::{find_vault_pubkey, Drip, DripPosition, DripVault, VaultSeeds};
pub use wallet::Wallet;
