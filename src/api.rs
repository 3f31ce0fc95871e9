//! Boundary to the Drip protocol.
//!
//! Everything the examples need from the outside world goes through
//! [`DripApi`]: token and proto-config discovery, account snapshots and the
//! position lifecycle transactions. [`crate::DripClient`] implements it
//! against a Drip gateway plus a Solana RPC node.

use crate::error::Result;
use crate::types::{
    DepositParams, DepositResult, PositionAccount, TokenBs, TxResult, VaultAccount,
    VaultProtoConfig,
};
use solana_sdk::pubkey::Pubkey;

#[allow(async_fn_in_trait)]
pub trait DripApi {
    /// Drip program that owns vaults and positions
    fn program_id(&self) -> Pubkey;

    /// Wallet that signs and pays for every transaction
    fn owner(&self) -> Pubkey;

    /// Counter-assets a vault can be opened for, given the base asset
    async fn get_all_token_bs(&self, token_a: &Pubkey) -> Result<TokenBs>;

    /// Proto configs with a live vault for the pair, in the order the
    /// protocol reports them
    async fn get_supported_vault_proto_configs_for_pair(
        &self,
        token_a: &Pubkey,
        token_b: &Pubkey,
    ) -> Result<Vec<VaultProtoConfig>>;

    async fn fetch_vault_account(&self, vault: &Pubkey) -> Result<Option<VaultAccount>>;

    async fn fetch_position_account(&self, position: &Pubkey) -> Result<Option<PositionAccount>>;

    /// Open a position in `vault`, waiting for confirmation
    async fn deposit(
        &self,
        vault: &Pubkey,
        params: &DepositParams,
        with_metadata: bool,
    ) -> Result<DepositResult>;

    /// Create (or reuse) a token account for `mint` owned by `owner`
    async fn create_token_account(&self, mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey>;

    /// Withdraw the token B accumulated by a position
    async fn withdraw_b(&self, position: &Pubkey) -> Result<TxResult>;

    async fn close_position(&self, position: &Pubkey) -> Result<TxResult>;
}
