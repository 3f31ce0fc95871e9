//! Serde adapters for the gateway's JSON encoding.
//!
//! `Pubkey`'s own serde impl writes a byte array; the gateway speaks base58
//! strings. Large integers arrive either as JSON numbers or as decimal
//! strings depending on the field.

/// `Pubkey` as a base58 string.
pub mod pubkey {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        Pubkey::from_str(&raw).map_err(|e| D::Error::custom(format!("invalid pubkey {raw}: {e}")))
    }
}

/// `Option<Pubkey>` as an optional base58 string.
pub mod option_pubkey {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(key: &Option<Pubkey>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(key) => s.serialize_some(&key.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Pubkey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(d)?
            .map(|raw| {
                Pubkey::from_str(&raw)
                    .map_err(|e| D::Error::custom(format!("invalid pubkey {raw}: {e}")))
            })
            .transpose()
    }
}

/// `u64` accepted as either a JSON number or a decimal string, written as a number.
pub mod u64_or_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S>(value: &u64, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(*value)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(d)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integer string {text}"))),
        }
    }
}
