#![allow(dead_code)]

use drip_vault_examples::{
    find_vault_pubkey, DepositParams, DepositResult, DripApi, DripError, PositionAccount, Result,
    TokenBs, TokenInfo, TxResult, VaultAccount, VaultProtoConfig, VaultSeeds,
};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory Drip protocol: vaults keyed by their derived address, positions
/// created by deposits, and a log of every call made through [`DripApi`].
#[derive(Debug)]
pub struct InMemoryDrip {
    program_id: Pubkey,
    owner: Pubkey,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    token_bs: HashMap<Pubkey, TokenBs>,
    proto_configs: HashMap<(Pubkey, Pubkey), Vec<VaultProtoConfig>>,
    vaults: HashMap<Pubkey, VaultAccount>,
    positions: HashMap<Pubkey, PositionAccount>,
    token_accounts: HashMap<(Pubkey, Pubkey), Pubkey>,
    calls: Vec<String>,
    signatures: u64,
    ignore_referrer: bool,
}

impl InMemoryDrip {
    pub fn new(owner: Pubkey) -> Self {
        Self {
            program_id: Pubkey::new_unique(),
            owner,
            state: Mutex::new(State::default()),
        }
    }

    /// Register token B for token A with the given proto configs, creating
    /// the vault for each config. Returns the vault addresses in order.
    pub fn add_pair(
        &self,
        token_a: Pubkey,
        token_b: TokenInfo,
        configs: Vec<VaultProtoConfig>,
    ) -> Vec<Pubkey> {
        let mut state = self.state.lock().unwrap();
        state
            .token_bs
            .entry(token_a)
            .or_default()
            .insert(token_b.mint.to_string(), token_b.clone());

        let mut vaults = Vec::new();
        for config in &configs {
            let vault = find_vault_pubkey(
                &self.program_id,
                &VaultSeeds {
                    proto_config: config.pubkey,
                    token_a_mint: token_a,
                    token_b_mint: token_b.mint,
                },
            );
            state.vaults.insert(
                vault,
                VaultAccount {
                    proto_config: config.pubkey,
                    token_a_mint: token_a,
                    token_b_mint: token_b.mint,
                    token_a_account: Pubkey::new_unique(),
                    token_b_account: Pubkey::new_unique(),
                    treasury_token_b_account: Pubkey::new_unique(),
                    last_drip_period: 0,
                    drip_amount: 0,
                    drip_activation_timestamp: 1_700_000_000,
                },
            );
            vaults.push(vault);
        }
        state
            .proto_configs
            .insert((token_a, token_b.mint), configs);
        vaults
    }

    /// Make deposits record the treasury as referrer whatever was requested
    pub fn ignore_referrer(&self) {
        self.state.lock().unwrap().ignore_referrer = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn vault(&self, vault: &Pubkey) -> Option<VaultAccount> {
        self.state.lock().unwrap().vaults.get(vault).cloned()
    }

    pub fn position(&self, position: &Pubkey) -> Option<PositionAccount> {
        self.state.lock().unwrap().positions.get(position).cloned()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }

    fn next_signature(state: &mut State) -> String {
        state.signatures += 1;
        format!("sig{}", state.signatures)
    }
}

impl DripApi for InMemoryDrip {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn owner(&self) -> Pubkey {
        self.owner
    }

    async fn get_all_token_bs(&self, token_a: &Pubkey) -> Result<TokenBs> {
        self.record("get_all_token_bs");
        let state = self.state.lock().unwrap();
        Ok(state.token_bs.get(token_a).cloned().unwrap_or_default())
    }

    async fn get_supported_vault_proto_configs_for_pair(
        &self,
        token_a: &Pubkey,
        token_b: &Pubkey,
    ) -> Result<Vec<VaultProtoConfig>> {
        self.record("get_supported_vault_proto_configs_for_pair");
        let state = self.state.lock().unwrap();
        Ok(state
            .proto_configs
            .get(&(*token_a, *token_b))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_vault_account(&self, vault: &Pubkey) -> Result<Option<VaultAccount>> {
        self.record("fetch_vault_account");
        Ok(self.state.lock().unwrap().vaults.get(vault).cloned())
    }

    async fn fetch_position_account(&self, position: &Pubkey) -> Result<Option<PositionAccount>> {
        self.record("fetch_position_account");
        Ok(self.state.lock().unwrap().positions.get(position).cloned())
    }

    async fn deposit(
        &self,
        vault: &Pubkey,
        params: &DepositParams,
        with_metadata: bool,
    ) -> Result<DepositResult> {
        self.record(if with_metadata {
            "deposit_with_metadata"
        } else {
            "deposit"
        });
        let mut state = self.state.lock().unwrap();
        let account = state
            .vaults
            .get(vault)
            .cloned()
            .ok_or_else(|| DripError::api(404, format!("vault {} not found", vault)))?;

        let referrer = match params.referrer {
            Some(referrer) if !state.ignore_referrer => referrer,
            _ => account.treasury_token_b_account,
        };
        let swaps = params.drip_params.number_of_swaps;
        let position = Pubkey::new_unique();
        state.positions.insert(
            position,
            PositionAccount {
                vault: *vault,
                position_authority: Pubkey::new_unique(),
                deposited_token_a_amount: params.amount,
                withdrawn_token_b_amount: 0,
                deposit_timestamp: 1_700_000_100,
                drip_period_id_before_deposit: account.last_drip_period,
                number_of_swaps: swaps,
                periodic_drip_amount: params.amount / swaps,
                is_closed: false,
                referrer,
            },
        );

        Ok(DepositResult {
            id: Self::next_signature(&mut state),
            position,
            position_metadata_account: with_metadata.then(Pubkey::new_unique),
        })
    }

    async fn create_token_account(&self, mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey> {
        self.record("create_token_account");
        let mut state = self.state.lock().unwrap();
        let account = *state
            .token_accounts
            .entry((*mint, *owner))
            .or_insert_with(Pubkey::new_unique);
        Ok(account)
    }

    async fn withdraw_b(&self, position: &Pubkey) -> Result<TxResult> {
        self.record("withdraw_b");
        let mut state = self.state.lock().unwrap();
        let account = state
            .positions
            .get_mut(position)
            .filter(|p| !p.is_closed)
            .ok_or_else(|| DripError::api(400, format!("position {} not open", position)))?;
        account.withdrawn_token_b_amount = account.deposited_token_a_amount;
        Ok(TxResult {
            id: Self::next_signature(&mut state),
        })
    }

    async fn close_position(&self, position: &Pubkey) -> Result<TxResult> {
        self.record("close_position");
        let mut state = self.state.lock().unwrap();
        let account = state
            .positions
            .get_mut(position)
            .filter(|p| !p.is_closed)
            .ok_or_else(|| DripError::api(400, format!("position {} not open", position)))?;
        account.is_closed = true;
        Ok(TxResult {
            id: Self::next_signature(&mut state),
        })
    }
}

pub fn token(symbol: &str) -> TokenInfo {
    TokenInfo {
        mint: Pubkey::new_unique(),
        symbol: Some(symbol.to_string()),
        decimals: Some(6),
    }
}

pub fn proto_config(granularity: u64) -> VaultProtoConfig {
    VaultProtoConfig {
        pubkey: Pubkey::new_unique(),
        granularity,
        trigger_dca_spread: 5,
        base_withdrawal_spread: 5,
        admin: None,
    }
}
