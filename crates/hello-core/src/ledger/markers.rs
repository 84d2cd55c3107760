//! Type-state tags carried by intents and transactions

use std::fmt;
use std::str::FromStr;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether signatures are present or erased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum SignatureKind {
    Signature,
    SignatureErased,
}

/// Proof readiness of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum ProofMarker {
    /// Already proven
    Proof,
    /// Proof still pending
    PreProof,
}

impl ProofMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofMarker::Proof => "proof",
            ProofMarker::PreProof => "pre-proof",
        }
    }
}

impl fmt::Display for ProofMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofMarker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "proof" => Ok(ProofMarker::Proof),
            "pre-proof" => Ok(ProofMarker::PreProof),
            other => Err(Error::Deserialization(format!("unknown proof marker: {}", other))),
        }
    }
}

/// Binding state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum BindingState {
    PreBinding,
    Binding,
}

impl BindingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingState::PreBinding => "pre-binding",
            BindingState::Binding => "binding",
        }
    }
}

/// Full tag set of an intent or transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct IntentMarkers {
    pub signature: SignatureKind,
    pub proof: ProofMarker,
    pub binding: BindingState,
}

impl IntentMarkers {
    pub const fn new(signature: SignatureKind, proof: ProofMarker, binding: BindingState) -> Self {
        Self {
            signature,
            proof,
            binding,
        }
    }

    /// Freshly built, not yet proven
    pub const fn unproven() -> Self {
        Self::new(SignatureKind::Signature, ProofMarker::PreProof, BindingState::PreBinding)
    }

    /// Proven but not yet bound
    pub const fn proven() -> Self {
        Self::new(SignatureKind::Signature, ProofMarker::Proof, BindingState::PreBinding)
    }

    /// Ready for submission
    pub const fn finalized() -> Self {
        Self::new(SignatureKind::Signature, ProofMarker::Proof, BindingState::Binding)
    }

    pub fn is_finalized(&self) -> bool {
        *self == Self::finalized()
    }
}

impl fmt::Display for IntentMarkers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = match self.signature {
            SignatureKind::Signature => "signature",
            SignatureKind::SignatureErased => "signature-erased",
        };
        write!(f, "{},{},{}", signature, self.proof, self.binding.as_str())
    }
}
