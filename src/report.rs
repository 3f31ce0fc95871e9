use crate::error::Result;
use crate::resolver::ResolvedVault;
use crate::types::{DepositResult, PositionAccount, TxResult};
use solana_sdk::pubkey::Pubkey;
use std::io::{self, Write};

/// Human-readable progress lines for the example programs
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn connected_wallet(&mut self, wallet: &Pubkey) -> Result<()> {
        self.line(format_args!("connected wallet {}", wallet))
    }

    pub fn resolved(&mut self, resolved: &ResolvedVault) -> Result<()> {
        self.line(format_args!(
            "tokenA {} tokenB {}",
            resolved.token_a_mint, resolved.token_b.mint
        ))?;
        self.line(format_args!(
            "vaultProtoConfig {} granularity {}",
            resolved.proto_config.pubkey, resolved.proto_config.granularity
        ))?;
        self.line(format_args!("vault {}", resolved.vault))
    }

    /// Title of a step, separated from the previous one by blank lines
    pub fn section(&mut self, title: &str) -> Result<()> {
        self.line(format_args!("\n\n\n{}", title))
    }

    pub fn deposit(&mut self, result: &DepositResult) -> Result<()> {
        self.line(format_args!("position {}", result.position))?;
        if let Some(metadata) = &result.position_metadata_account {
            self.line(format_args!("positionMetadataAccount {}", metadata))?;
        }
        self.line(format_args!("deposit txId {}", result.id))
    }

    pub fn referrer(
        &mut self,
        input: Option<&Pubkey>,
        treasury: Option<&Pubkey>,
        position: &PositionAccount,
    ) -> Result<()> {
        let input = input.map_or_else(|| "none".to_string(), |key| key.to_string());
        match treasury {
            Some(treasury) => self.line(format_args!(
                "referrer input {} vault treasury token account {} position referrer {}",
                input, treasury, position.referrer
            )),
            None => self.line(format_args!(
                "referrer input {} position referrer {}",
                input, position.referrer
            )),
        }
    }

    pub fn transaction(&mut self, label: &str, result: &TxResult) -> Result<()> {
        self.line(format_args!("{} txId {}", label, result.id))
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) -> Result<()> {
        writeln!(self.out, "{}", args)?;
        Ok(())
    }
}
