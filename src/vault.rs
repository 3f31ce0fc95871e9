use crate::api::DripApi;
use crate::error::{DripError, Result};
use crate::types::{DepositParams, DepositResult, PositionAccount, TxResult, VaultAccount};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

pub const VAULT_SEED: &[u8] = b"drip-v1";

/// Inputs of a vault address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultSeeds {
    pub proto_config: Pubkey,
    pub token_a_mint: Pubkey,
    pub token_b_mint: Pubkey,
}

/// Derive the vault PDA. Pure: no network access.
pub fn find_vault_pubkey(program_id: &Pubkey, seeds: &VaultSeeds) -> Pubkey {
    let (vault, _bump) = Pubkey::find_program_address(
        &[
            VAULT_SEED,
            seeds.token_a_mint.as_ref(),
            seeds.token_b_mint.as_ref(),
            seeds.proto_config.as_ref(),
        ],
        program_id,
    );
    vault
}

/// Entry point bundling a [`DripApi`] with handle constructors
#[derive(Debug, Clone)]
pub struct Drip<A> {
    api: A,
}

impl<A: DripApi> Drip<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn program_id(&self) -> Pubkey {
        self.api.program_id()
    }

    /// Live handle to an existing vault
    pub async fn get_vault(&self, address: Pubkey) -> Result<DripVault<'_, A>> {
        let account = self
            .api
            .fetch_vault_account(&address)
            .await?
            .ok_or_else(|| DripError::resolution(format!("Vault {} does not exist", address)))?;
        debug!(vault = %address, proto_config = %account.proto_config, "vault loaded");

        Ok(DripVault {
            api: &self.api,
            address,
            account,
        })
    }

    /// Handle to a position. The account itself is fetched on demand.
    pub fn get_position(&self, position: Pubkey) -> DripPosition<'_, A> {
        DripPosition {
            api: &self.api,
            address: position,
        }
    }
}

/// A vault together with the account snapshot taken when it was loaded
#[derive(Debug)]
pub struct DripVault<'a, A> {
    api: &'a A,
    address: Pubkey,
    account: VaultAccount,
}

impl<'a, A: DripApi> DripVault<'a, A> {
    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn account(&self) -> &VaultAccount {
        &self.account
    }

    /// Re-read the vault account
    pub async fn refresh(&mut self) -> Result<&VaultAccount> {
        self.account = self
            .api
            .fetch_vault_account(&self.address)
            .await?
            .ok_or_else(|| DripError::resolution(format!("Vault {} disappeared", self.address)))?;
        Ok(&self.account)
    }

    pub async fn deposit(&self, params: &DepositParams) -> Result<DepositResult> {
        params.validate()?;
        self.api.deposit(&self.address, params, false).await
    }

    /// Deposit and mint a token metadata record for the position NFT
    pub async fn deposit_with_metadata(&self, params: &DepositParams) -> Result<DepositResult> {
        params.validate()?;
        self.api.deposit(&self.address, params, true).await
    }

    /// Token B account owned by `referrer_wallet`, created if missing
    pub async fn referrer_account(&self, referrer_wallet: &Pubkey) -> Result<Pubkey> {
        self.api
            .create_token_account(&self.account.token_b_mint, referrer_wallet)
            .await
    }

    pub fn position(&self, position: Pubkey) -> DripPosition<'a, A> {
        DripPosition {
            api: self.api,
            address: position,
        }
    }
}

#[derive(Debug)]
pub struct DripPosition<'a, A> {
    api: &'a A,
    address: Pubkey,
}

impl<A: DripApi> DripPosition<'_, A> {
    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub async fn fetch(&self) -> Result<PositionAccount> {
        self.api
            .fetch_position_account(&self.address)
            .await?
            .ok_or_else(|| {
                DripError::resolution(format!("Position {} does not exist", self.address))
            })
    }

    pub async fn withdraw_b(&self) -> Result<TxResult> {
        self.api.withdraw_b(&self.address).await
    }

    pub async fn close_position(&self) -> Result<TxResult> {
        self.api.close_position(&self.address).await
    }
}
