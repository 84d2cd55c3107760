//! Ledger transaction model
//!
//! Transactions are split into intents keyed by segment id. Each intent may
//! carry a guaranteed and a fallible unshielded offer whose inputs must be
//! signed by their owners before the ledger accepts the transaction.

pub mod intent;
pub mod markers;
pub mod offer;
pub mod signing;
pub mod transaction;

pub use intent::{ContractAction, DustRegistration, DustSpend, Intent};
pub use markers::{BindingState, IntentMarkers, ProofMarker, SignatureKind};
pub use offer::{UnshieldedOffer, Utxo, UtxoOutput, UtxoSpend};
pub use signing::{sign_recipe, sign_transaction_intents};
pub use transaction::{Recipe, Transaction};
