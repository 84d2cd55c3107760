//! Error types for the Hello core library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by key handling, addresses and the transaction model
#[derive(Error, Debug)]
pub enum Error {
    /// Seed length is outside what BIP32 accepts
    #[error("Invalid seed")]
    InvalidSeed,

    /// HD derivation or key construction rejected the input
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Bytes or JSON could not be decoded into a ledger value
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A value could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Producing or checking a Schnorr signature failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Bech32m address with a bad prefix, checksum or payload
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Contract address that is not 32 bytes of hex
    #[error("Invalid contract address: {0}")]
    InvalidContractAddress(String),

    /// Transaction shape violates a ledger rule
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Malformed hex string
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl From<bitcode::Error> for Error {
    fn from(e: bitcode::Error) -> Self {
        Error::Deserialization(e.to_string())
    }
}
