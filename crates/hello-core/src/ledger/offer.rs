//! Unshielded offers: coin spends, outputs, and per-input signatures

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{hex_bytes_32, Signature, TokenType, UnshieldedPublicKey};

/// An unshielded coin, identified by the intent that created it and its output index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct Utxo {
    pub value: u128,
    pub owner: UnshieldedPublicKey,
    pub token_type: TokenType,
    #[serde(with = "hex_bytes_32")]
    pub intent_hash: [u8; 32],
    pub output_no: u32,
}

/// Spending a [`Utxo`] references it in full
pub type UtxoSpend = Utxo;

/// A new unshielded coin created by an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct UtxoOutput {
    pub value: u128,
    pub owner: UnshieldedPublicKey,
    pub token_type: TokenType,
}

/// Unshielded inputs and outputs with one signature slot per input
///
/// `signatures` may be shorter than `inputs`; positions past its end are unsigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct UnshieldedOffer {
    pub inputs: Vec<UtxoSpend>,
    pub outputs: Vec<UtxoOutput>,
    pub signatures: Vec<Signature>,
}

impl UnshieldedOffer {
    pub fn new(inputs: Vec<UtxoSpend>, outputs: Vec<UtxoOutput>) -> Self {
        Self {
            inputs,
            outputs,
            signatures: Vec::new(),
        }
    }

    /// Offer carrying `signatures` in place of the current list
    pub fn add_signatures(&self, signatures: Vec<Signature>) -> Result<Self> {
        if signatures.len() > self.inputs.len() {
            return Err(Error::Ledger(format!(
                "{} signatures for {} inputs",
                signatures.len(),
                self.inputs.len()
            )));
        }
        Ok(Self {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            signatures,
        })
    }

    pub fn signature_at(&self, index: usize) -> Option<&Signature> {
        self.signatures.get(index)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() == self.inputs.len()
    }

    pub fn value_in(&self, token_type: &TokenType) -> u128 {
        self.inputs
            .iter()
            .filter(|i| &i.token_type == token_type)
            .map(|i| i.value)
            .sum()
    }

    pub fn value_out(&self, token_type: &TokenType) -> u128 {
        self.outputs
            .iter()
            .filter(|o| &o.token_type == token_type)
            .map(|o| o.value)
            .sum()
    }
}
