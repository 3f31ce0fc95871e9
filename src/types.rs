use crate::error::{DripError, Result};
use crate::serde_utils;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeMap, HashMap};

// ===== Token Types =====

/// A counter-asset ("token B") a vault can drip into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(with = "serde_utils::pubkey")]
    pub mint: Pubkey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

/// Counter-assets keyed by mint (base58). Iterates in mint order.
pub type TokenBs = BTreeMap<String, TokenInfo>;

// ===== Vault Types =====

/// Schedule parameters shared by every vault created under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultProtoConfig {
    #[serde(with = "serde_utils::pubkey")]
    pub pubkey: Pubkey,
    /// Seconds between two drips
    #[serde(with = "serde_utils::u64_or_string")]
    pub granularity: u64,
    #[serde(default)]
    pub trigger_dca_spread: u16,
    #[serde(default)]
    pub base_withdrawal_spread: u16,
    #[serde(
        default,
        with = "serde_utils::option_pubkey",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin: Option<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultAccount {
    #[serde(with = "serde_utils::pubkey")]
    pub proto_config: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub token_a_mint: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub token_b_mint: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub token_a_account: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub token_b_account: Pubkey,
    /// Default referrer for deposits that do not name one
    #[serde(with = "serde_utils::pubkey")]
    pub treasury_token_b_account: Pubkey,
    #[serde(default, with = "serde_utils::u64_or_string")]
    pub last_drip_period: u64,
    #[serde(default, with = "serde_utils::u64_or_string")]
    pub drip_amount: u64,
    #[serde(default)]
    pub drip_activation_timestamp: i64,
}

// ===== Position Types =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAccount {
    #[serde(with = "serde_utils::pubkey")]
    pub vault: Pubkey,
    /// Mint of the NFT that grants authority over the position
    #[serde(with = "serde_utils::pubkey")]
    pub position_authority: Pubkey,
    #[serde(with = "serde_utils::u64_or_string")]
    pub deposited_token_a_amount: u64,
    #[serde(default, with = "serde_utils::u64_or_string")]
    pub withdrawn_token_b_amount: u64,
    #[serde(default)]
    pub deposit_timestamp: i64,
    #[serde(default, with = "serde_utils::u64_or_string")]
    pub drip_period_id_before_deposit: u64,
    #[serde(with = "serde_utils::u64_or_string")]
    pub number_of_swaps: u64,
    #[serde(default, with = "serde_utils::u64_or_string")]
    pub periodic_drip_amount: u64,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(with = "serde_utils::pubkey")]
    pub referrer: Pubkey,
}

impl PositionAccount {
    /// Deposit time as a UTC timestamp, if it is representable
    pub fn deposited_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.deposit_timestamp, 0)
    }
}

// ===== Deposit Types =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DripParams {
    #[serde(with = "serde_utils::u64_or_string")]
    pub number_of_swaps: u64,
}

/// Parameters for one deposit. Amounts are in token A base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositParams {
    pub amount: u64,
    pub drip_params: DripParams,
    /// Token B account credited with the referral; the vault treasury when `None`
    pub referrer: Option<Pubkey>,
}

impl DepositParams {
    pub fn new(amount: u64, number_of_swaps: u64) -> Self {
        Self {
            amount,
            drip_params: DripParams { number_of_swaps },
            referrer: None,
        }
    }

    pub fn with_referrer(mut self, referrer: Pubkey) -> Self {
        self.referrer = Some(referrer);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount == 0 {
            return Err(DripError::validation("Deposit amount must be positive"));
        }
        let swaps = self.drip_params.number_of_swaps;
        if swaps == 0 {
            return Err(DripError::validation("Number of swaps must be positive"));
        }
        if self.amount < swaps {
            return Err(DripError::validation(format!(
                "Deposit of {} cannot be split into {} swaps",
                self.amount, swaps
            )));
        }
        Ok(())
    }
}

/// Outcome of a confirmed deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    /// Transaction signature
    pub id: String,
    pub position: Pubkey,
    /// Only set for deposits that requested token metadata
    pub position_metadata_account: Option<Pubkey>,
}

/// Outcome of a confirmed position transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub id: String,
}

// ===== Gateway Wire Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoConfigQuery {
    #[serde(with = "serde_utils::pubkey")]
    pub token_a: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub token_b: Pubkey,
}

impl ProtoConfigQuery {
    pub fn to_query_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("tokenA".to_string(), self.token_a.to_string());
        params.insert("tokenB".to_string(), self.token_b.to_string());
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    #[serde(with = "serde_utils::pubkey")]
    pub vault: Pubkey,
    #[serde(with = "serde_utils::pubkey")]
    pub owner: Pubkey,
    #[serde(with = "serde_utils::u64_or_string")]
    pub amount: u64,
    pub drip_params: DripParams,
    #[serde(
        default,
        with = "serde_utils::option_pubkey",
        skip_serializing_if = "Option::is_none"
    )]
    pub referrer: Option<Pubkey>,
    pub with_metadata: bool,
}

impl DepositRequest {
    pub fn new(vault: Pubkey, owner: Pubkey, params: &DepositParams, with_metadata: bool) -> Self {
        Self {
            vault,
            owner,
            amount: params.amount,
            drip_params: params.drip_params,
            referrer: params.referrer,
            with_metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTxRequest {
    #[serde(with = "serde_utils::pubkey")]
    pub owner: Pubkey,
}

/// Transaction built by the gateway, awaiting the wallet's signature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// Base64 of the bincode-serialized transaction
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositTransaction {
    pub transaction: String,
    #[serde(with = "serde_utils::pubkey")]
    pub position: Pubkey,
    #[serde(
        default,
        with = "serde_utils::option_pubkey",
        skip_serializing_if = "Option::is_none"
    )]
    pub position_metadata_account: Option<Pubkey>,
}
