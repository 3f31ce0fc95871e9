use crate::error::{DripError, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use std::fmt;

/// Signing wallet loaded from a JSON byte array, the format `solana-keygen`
/// writes keypair files in.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Parse a JSON array of byte values (e.g. `[92,116,...,245,129]`)
    pub fn from_json(raw: &str) -> Result<Self> {
        let bytes: Vec<u8> = serde_json::from_str(raw.trim()).map_err(|e| {
            DripError::wallet(format!("Wallet secret is not a JSON byte array: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Build a wallet from a raw 64-byte ed25519 secret
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(DripError::wallet(format!(
                "Wallet secret must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        #[allow(deprecated)]
        let keypair = Keypair::from_bytes(bytes)
            .map_err(|e| DripError::wallet(format!("Invalid wallet secret: {}", e)))?;
        Ok(Self { keypair })
    }

    /// Read the wallet secret from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let raw = std::env::var(var)
            .map_err(|_| DripError::config(format!("Environment variable {} is not set", var)))?;
        Self::from_json(&raw)
    }

    /// Generate a random wallet
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Encode the secret back into the JSON byte array format
    pub fn to_json(&self) -> String {
        let bytes = self.keypair.to_bytes();
        // A Vec<u8> always serializes.
        serde_json::to_string(&bytes.to_vec()).unwrap_or_default()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Sign a transaction built elsewhere, keeping its blockhash and any
    /// signatures other signers already placed on it.
    pub fn sign_transaction(&self, transaction: &mut Transaction) -> Result<Signature> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| DripError::signing(e.to_string()))?;

        let index = transaction
            .message
            .account_keys
            .iter()
            .position(|key| *key == self.pubkey())
            .ok_or_else(|| DripError::signing("Wallet is not a signer of the transaction"))?;
        Ok(transaction.signatures[index])
    }
}

impl Clone for Wallet {
    fn clone(&self) -> Self {
        Self {
            keypair: self.keypair.insecure_clone(),
        }
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        message::Message,
    };

    fn signer_ix(signer: Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[0],
            vec![AccountMeta::new(signer, true)],
        )
    }

    #[test]
    fn test_wallet_from_json_is_deterministic() {
        let original = Wallet::generate();
        let json = original.to_json();

        let first = Wallet::from_json(&json).unwrap();
        let second = Wallet::from_json(&json).unwrap();

        assert_eq!(first.pubkey(), original.pubkey());
        assert_eq!(first.pubkey(), second.pubkey());
    }

    #[test]
    fn test_wallet_rejects_wrong_length() {
        let err = Wallet::from_json("[1,2,3]").unwrap_err();
        assert!(matches!(err, DripError::Wallet(_)));
    }

    #[test]
    fn test_wallet_rejects_malformed_json() {
        assert!(matches!(
            Wallet::from_json("not json").unwrap_err(),
            DripError::Wallet(_)
        ));
        // 256 does not fit a byte
        let mut values = vec!["1"; 63];
        values.push("256");
        let raw = format!("[{}]", values.join(","));
        assert!(matches!(
            Wallet::from_json(&raw).unwrap_err(),
            DripError::Wallet(_)
        ));
    }

    #[test]
    fn test_wallet_from_missing_env() {
        let err = Wallet::from_env("DRIP_WALLET_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, DripError::Config(_)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let wallet = Wallet::generate();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(&wallet.pubkey().to_string()));
        assert!(!debug.contains(&wallet.to_json()));
    }

    #[test]
    fn test_sign_transaction_keeps_blockhash() {
        let wallet = Wallet::generate();
        let blockhash = Hash::new_unique();
        let ix = signer_ix(wallet.pubkey());
        let message = Message::new_with_blockhash(&[ix], Some(&wallet.pubkey()), &blockhash);
        let mut tx = Transaction::new_unsigned(message);

        let signature = wallet.sign_transaction(&mut tx).unwrap();

        assert_eq!(tx.message.recent_blockhash, blockhash);
        assert_eq!(tx.signatures[0], signature);
        assert!(tx.is_signed());
    }

    #[test]
    fn test_sign_transaction_requires_wallet_signer() {
        let wallet = Wallet::generate();
        let other = Pubkey::new_unique();
        let ix = signer_ix(other);
        let message = Message::new_with_blockhash(&[ix], Some(&other), &Hash::new_unique());
        let mut tx = Transaction::new_unsigned(message);

        assert!(wallet.sign_transaction(&mut tx).is_err());
    }
}
