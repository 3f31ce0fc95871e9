use crate::api::DripApi;
use crate::error::{DripError, Result};
use crate::types::{TokenInfo, VaultProtoConfig};
use crate::vault::{find_vault_pubkey, VaultSeeds};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

/// How a proto config is picked among those supported for a pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// First config in the order the protocol returned them
    #[default]
    First,
    /// Smallest granularity (most frequent drips); ties go to the smaller pubkey
    ShortestGranularity,
}

impl SelectionPolicy {
    pub fn select<'c>(&self, configs: &'c [VaultProtoConfig]) -> Option<&'c VaultProtoConfig> {
        match self {
            SelectionPolicy::First => configs.first(),
            SelectionPolicy::ShortestGranularity => configs
                .iter()
                .min_by(|a, b| {
                    a.granularity
                        .cmp(&b.granularity)
                        .then_with(|| a.pubkey.to_bytes().cmp(&b.pubkey.to_bytes()))
                }),
        }
    }
}

/// Everything needed to address one vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVault {
    pub token_a_mint: Pubkey,
    pub token_b: TokenInfo,
    pub proto_config: VaultProtoConfig,
    pub vault: Pubkey,
}

impl ResolvedVault {
    pub fn token_b_mint(&self) -> Pubkey {
        self.token_b.mint
    }
}

/// Picks a counter-asset and proto config for a base asset and derives the vault
#[derive(Debug)]
pub struct VaultResolver<'a, A> {
    api: &'a A,
    policy: SelectionPolicy,
}

impl<'a, A: DripApi> VaultResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The counter-asset with the smallest mint (base58 order)
    pub async fn select_token_b(&self, token_a: &Pubkey) -> Result<TokenInfo> {
        let token_bs = self.api.get_all_token_bs(token_a).await?;
        debug!(%token_a, candidates = token_bs.len(), "token B candidates");

        token_bs
            .into_values()
            .next()
            .ok_or_else(|| DripError::resolution(format!("No token B available for {}", token_a)))
    }

    pub async fn select_proto_config(
        &self,
        token_a: &Pubkey,
        token_b: &Pubkey,
    ) -> Result<VaultProtoConfig> {
        let configs = self
            .api
            .get_supported_vault_proto_configs_for_pair(token_a, token_b)
            .await?;
        debug!(%token_a, %token_b, candidates = configs.len(), "proto config candidates");

        self.policy.select(&configs).cloned().ok_or_else(|| {
            DripError::resolution(format!(
                "No supported vault proto config for {} / {}",
                token_a, token_b
            ))
        })
    }

    pub async fn resolve(&self, token_a: &Pubkey) -> Result<ResolvedVault> {
        let token_b = self.select_token_b(token_a).await?;
        let proto_config = self.select_proto_config(token_a, &token_b.mint).await?;

        let vault = find_vault_pubkey(
            &self.api.program_id(),
            &VaultSeeds {
                proto_config: proto_config.pubkey,
                token_a_mint: *token_a,
                token_b_mint: token_b.mint,
            },
        );
        info!(
            %token_a,
            token_b = %token_b.mint,
            proto_config = %proto_config.pubkey,
            %vault,
            "vault resolved"
        );

        Ok(ResolvedVault {
            token_a_mint: *token_a,
            token_b,
            proto_config,
            vault,
        })
    }
}
