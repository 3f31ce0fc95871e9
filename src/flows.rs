//! The example scenarios: resolve a vault, run the deposit variants, and
//! walk a position through withdraw and close. Every step awaits the
//! previous one.

use crate::api::DripApi;
use crate::config::DripConfig;
use crate::error::{DripError, Result};
use crate::report::Reporter;
use crate::resolver::{ResolvedVault, SelectionPolicy, VaultResolver};
use crate::types::{DepositParams, DepositResult, PositionAccount, TxResult};
use crate::vault::{Drip, DripPosition, DripVault};
use solana_sdk::pubkey::Pubkey;
use std::io::Write;

/// Size and schedule of each example deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPlan {
    pub amount: u64,
    pub number_of_swaps: u64,
}

impl DepositPlan {
    pub fn new(amount: u64, number_of_swaps: u64) -> Self {
        Self {
            amount,
            number_of_swaps,
        }
    }

    pub fn from_config(config: &DripConfig) -> Self {
        Self::new(config.deposit_amount, config.number_of_swaps)
    }

    pub fn params(&self) -> DepositParams {
        DepositParams::new(self.amount, self.number_of_swaps)
    }
}

/// A deposit whose position was read back to compare its referrer
#[derive(Debug, Clone)]
pub struct ReferrerCheck {
    pub deposit: DepositResult,
    pub expected: Pubkey,
    pub position: PositionAccount,
}

#[derive(Debug, Clone)]
pub struct DepositSummary {
    pub with_referrer: ReferrerCheck,
    pub without_referrer: ReferrerCheck,
    pub with_metadata: DepositResult,
    pub without_metadata: DepositResult,
}

#[derive(Debug, Clone)]
pub struct WithdrawSummary {
    pub deposit: DepositResult,
    pub withdraw: TxResult,
    pub close: TxResult,
}

pub async fn resolve_vault<'d, A, W>(
    drip: &'d Drip<A>,
    token_a: &Pubkey,
    policy: SelectionPolicy,
    reporter: &mut Reporter<W>,
) -> Result<(ResolvedVault, DripVault<'d, A>)>
where
    A: DripApi,
    W: Write,
{
    let resolved = VaultResolver::new(drip.api())
        .with_policy(policy)
        .resolve(token_a)
        .await?;
    reporter.resolved(&resolved)?;

    let vault = drip.get_vault(resolved.vault).await?;
    Ok((resolved, vault))
}

pub async fn deposit_without_metadata<A: DripApi, W: Write>(
    vault: &DripVault<'_, A>,
    plan: &DepositPlan,
    reporter: &mut Reporter<W>,
) -> Result<DepositResult> {
    reporter.section("Deposit Without TokenMetadata")?;
    let result = vault.deposit(&plan.params()).await?;
    reporter.deposit(&result)?;
    Ok(result)
}

pub async fn deposit_with_metadata<A: DripApi, W: Write>(
    vault: &DripVault<'_, A>,
    plan: &DepositPlan,
    reporter: &mut Reporter<W>,
) -> Result<DepositResult> {
    reporter.section("Deposit With TokenMetadata")?;
    let result = vault.deposit_with_metadata(&plan.params()).await?;
    reporter.deposit(&result)?;

    match result.position_metadata_account {
        Some(metadata) if metadata != result.position => Ok(result),
        Some(_) => Err(DripError::validation(
            "Position metadata account equals the position",
        )),
        None => Err(DripError::validation(
            "Deposit with metadata returned no metadata account",
        )),
    }
}

/// Deposit with no referrer; the position must credit the vault treasury
pub async fn deposit_without_referrer<A: DripApi, W: Write>(
    vault: &DripVault<'_, A>,
    plan: &DepositPlan,
    reporter: &mut Reporter<W>,
) -> Result<ReferrerCheck> {
    reporter.section("Deposit Without Referrer")?;
    let treasury = vault.account().treasury_token_b_account;

    let deposit = vault.deposit(&plan.params()).await?;
    reporter.deposit(&deposit)?;
    let position = vault.position(deposit.position).fetch().await?;
    reporter.referrer(None, Some(&treasury), &position)?;

    check_referrer(deposit, treasury, position)
}

/// Deposit crediting a token B account owned by `referrer_wallet`
pub async fn deposit_with_referrer<A: DripApi, W: Write>(
    vault: &DripVault<'_, A>,
    referrer_wallet: &Pubkey,
    plan: &DepositPlan,
    reporter: &mut Reporter<W>,
) -> Result<ReferrerCheck> {
    reporter.section("Deposit With Referrer")?;
    let referrer = vault.referrer_account(referrer_wallet).await?;

    let deposit = vault
        .deposit(&plan.params().with_referrer(referrer))
        .await?;
    reporter.deposit(&deposit)?;
    let position = vault.position(deposit.position).fetch().await?;
    reporter.referrer(Some(&referrer), None, &position)?;

    check_referrer(deposit, referrer, position)
}

pub async fn withdraw_and_close<A: DripApi, W: Write>(
    position: &DripPosition<'_, A>,
    reporter: &mut Reporter<W>,
) -> Result<(TxResult, TxResult)> {
    let withdraw = position.withdraw_b().await?;
    reporter.transaction("withdraw", &withdraw)?;

    let close = position.close_position().await?;
    reporter.transaction("close position", &close)?;

    Ok((withdraw, close))
}

/// Every deposit variant against one resolved vault. The wallet refers itself.
pub async fn run_deposit_examples<A: DripApi, W: Write>(
    drip: &Drip<A>,
    config: &DripConfig,
    reporter: &mut Reporter<W>,
) -> Result<DepositSummary> {
    let plan = DepositPlan::from_config(config);
    let (_, vault) = resolve_vault(
        drip,
        &config.token_a_mint,
        SelectionPolicy::First,
        reporter,
    )
    .await?;

    let referrer_wallet = drip.api().owner();
    let with_referrer = deposit_with_referrer(&vault, &referrer_wallet, &plan, reporter).await?;
    let without_referrer = deposit_without_referrer(&vault, &plan, reporter).await?;
    let with_metadata = deposit_with_metadata(&vault, &plan, reporter).await?;
    let without_metadata = deposit_without_metadata(&vault, &plan, reporter).await?;

    Ok(DepositSummary {
        with_referrer,
        without_referrer,
        with_metadata,
        without_metadata,
    })
}

/// Deposit, then withdraw token B and close the new position
pub async fn run_withdraw_example<A: DripApi, W: Write>(
    drip: &Drip<A>,
    config: &DripConfig,
    reporter: &mut Reporter<W>,
) -> Result<WithdrawSummary> {
    let plan = DepositPlan::from_config(config);
    let (_, vault) = resolve_vault(
        drip,
        &config.token_a_mint,
        SelectionPolicy::First,
        reporter,
    )
    .await?;

    let deposit = vault.deposit(&plan.params()).await?;
    reporter.deposit(&deposit)?;

    let position = drip.get_position(deposit.position);
    let (withdraw, close) = withdraw_and_close(&position, reporter).await?;

    Ok(WithdrawSummary {
        deposit,
        withdraw,
        close,
    })
}

fn check_referrer(
    deposit: DepositResult,
    expected: Pubkey,
    position: PositionAccount,
) -> Result<ReferrerCheck> {
    if position.referrer != expected {
        return Err(DripError::ReferrerMismatch {
            expected,
            actual: position.referrer,
        });
    }
    Ok(ReferrerCheck {
        deposit,
        expected,
        position,
    })
}
