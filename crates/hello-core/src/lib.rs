//! Hello Core - Ledger types, intent signing, and key material
//!
//! This crate provides the foundational types for the Hello Midnight client:
//! the transaction/intent model produced by wallet balancing, the intent
//! re-signing pass applied before finalization, HD key derivation, and the
//! Hello contract definition.

pub mod address;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod hd;
pub mod keys;
pub mod ledger;
pub mod types;

pub use address::{AddressKind, MidnightAddress};
pub use contract::{CompiledContract, ContractState, StateOp, StateValue};
pub use error::{Error, Result};
pub use hd::{generate_random_seed, DerivedKeys, HdWallet, Role};
pub use keys::{DustSecretKey, ShieldedSecretKeys, UnshieldedKeystore};
pub use ledger::{
    sign_recipe, sign_transaction_intents, BindingState, ContractAction, DustRegistration,
    DustSpend, Intent, IntentMarkers, ProofMarker, Recipe, SignatureKind, Transaction,
    UnshieldedOffer, Utxo, UtxoOutput, UtxoSpend,
};
pub use types::{
    ContractAddress, NetworkId, SegmentId, Signature, TokenType, TxId, UnshieldedPublicKey,
};

/// BIP-44 coin type registered for Midnight
pub const COIN_TYPE: u32 = 2400;

/// Segment id used for the first intent of a transaction
pub const DEFAULT_SEGMENT: SegmentId = 1;

/// Smallest units per NIGHT
pub const STARS_PER_NIGHT: u128 = 1_000_000;

/// Smallest units per DUST
pub const SPECKS_PER_DUST: u128 = 1_000_000_000_000_000;
