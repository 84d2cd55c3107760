//! Core newtypes shared across the ledger model

use std::fmt;
use std::str::FromStr;

use bitcode::{Decode, Encode};
use k256::schnorr::{signature::Verifier, Signature as SchnorrSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::tagged_hash;
use crate::error::{Error, Result};

/// Index of an intent within a transaction
pub type SegmentId = u16;

/// Network a wallet and its addresses belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Undeployed,
    DevNet,
    TestNet,
    PreProd,
    MainNet,
}

impl NetworkId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Undeployed => "undeployed",
            NetworkId::DevNet => "devnet",
            NetworkId::TestNet => "testnet",
            NetworkId::PreProd => "preprod",
            NetworkId::MainNet => "mainnet",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "undeployed" => Ok(NetworkId::Undeployed),
            "devnet" => Ok(NetworkId::DevNet),
            "testnet" => Ok(NetworkId::TestNet),
            "preprod" => Ok(NetworkId::PreProd),
            "mainnet" => Ok(NetworkId::MainNet),
            other => Err(Error::Ledger(format!("unknown network id: {}", other))),
        }
    }
}

/// Token type identifier (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode)]
pub struct TokenType(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl TokenType {
    /// The native unshielded token (NIGHT)
    pub const fn night() -> Self {
        Self([0u8; 32])
    }

    pub fn is_night(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// BIP-340 Schnorr signature (64 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// X-only public key owning unshielded coins (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode)]
pub struct UnshieldedPublicKey(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl UnshieldedPublicKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature made over `payload` by the matching keystore
    pub fn verify(&self, payload: &[u8], signature: &Signature) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| Error::Signing(format!("Invalid public key: {}", e)))?;
        let sig = SchnorrSignature::try_from(signature.as_bytes().as_slice())
            .map_err(|e| Error::Signing(format!("Invalid signature format: {}", e)))?;
        key.verify(payload, &sig)
            .map_err(|_| Error::Signing("Signature verification failed".to_string()))
    }
}

/// Contract address (32 bytes, shown as 64 hex characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode)]
pub struct ContractAddress(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl ContractAddress {
    /// Derive the address of a contract deployed with the given nonce
    pub fn derive(deploy_nonce: &[u8; 32]) -> Self {
        Self(tagged_hash("midnight:contract-address", &[deploy_nonce]))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a user-supplied address, rejecting anything but 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 64 {
            return Err(Error::InvalidContractAddress(format!(
                "expected 64 hex characters, got {}",
                trimmed.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(trimmed, &mut bytes)
            .map_err(|e| Error::InvalidContractAddress(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Short display form used in menu headers
    pub fn short(&self) -> String {
        format!("{}...", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Transaction identifier (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct TxId(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl TxId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Serde helper for 32-byte arrays as hex strings
pub mod hex_bytes_32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}
