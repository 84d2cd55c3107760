//! Contract definitions and public ledger state
//!
//! A contract's public state is a map of named fields. Circuits do not run on
//! the ledger: the caller computes the state transcript locally and the ledger
//! applies it once the call is proven.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single public state value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum StateValue {
    Null,
    Cell(Vec<u8>),
}

/// One write performed by a circuit against public state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum StateOp {
    Write { field: String, value: StateValue },
}

/// Public state of a deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ContractState {
    /// Named public ledger fields
    pub data: BTreeMap<String, StateValue>,

    /// Entry points callable on this contract
    pub operations: Vec<String>,
}

impl ContractState {
    pub fn new(operations: Vec<String>) -> Self {
        Self {
            data: BTreeMap::new(),
            operations,
        }
    }

    pub fn field(&self, name: &str) -> Option<&StateValue> {
        self.data.get(name)
    }

    /// Apply a circuit transcript to this state
    pub fn apply(&mut self, transcript: &[StateOp]) {
        for op in transcript {
            match op {
                StateOp::Write { field, value } => {
                    self.data.insert(field.clone(), value.clone());
                }
            }
        }
    }

    pub fn has_operation(&self, entry_point: &str) -> bool {
        self.operations.iter().any(|op| op == entry_point)
    }
}

/// Witness configuration for a compiled contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Witnesses {
    /// No private witnesses are required
    Vacant,
    /// Witnesses are supplied by the caller at call time
    Provided,
}

/// A contract definition bound to its compiled ZK assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledContract {
    name: String,
    circuits: Vec<String>,
    witnesses: Witnesses,
    zk_assets_path: Option<PathBuf>,
}

impl CompiledContract {
    pub fn make(name: impl Into<String>, circuits: &[&str]) -> Self {
        Self {
            name: name.into(),
            circuits: circuits.iter().map(|c| c.to_string()).collect(),
            witnesses: Witnesses::Provided,
            zk_assets_path: None,
        }
    }

    pub fn with_vacant_witnesses(mut self) -> Self {
        self.witnesses = Witnesses::Vacant;
        self
    }

    pub fn with_compiled_file_assets(mut self, path: impl AsRef<Path>) -> Self {
        self.zk_assets_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn circuits(&self) -> &[String] {
        &self.circuits
    }

    pub fn witnesses(&self) -> Witnesses {
        self.witnesses
    }

    pub fn zk_assets_path(&self) -> Option<&Path> {
        self.zk_assets_path.as_deref()
    }

    pub fn has_circuit(&self, circuit: &str) -> bool {
        self.circuits.iter().any(|c| c == circuit)
    }
}

/// The Hello World contract
pub mod hello {
    use super::*;

    pub const CONTRACT_NAME: &str = "hello";

    /// Circuit storing a message in public state
    pub const STORE_MESSAGE: &str = "storeMessage";

    /// Public ledger field holding the message
    pub const MESSAGE_FIELD: &str = "message";

    pub fn compiled(zk_config_path: impl AsRef<Path>) -> CompiledContract {
        CompiledContract::make(CONTRACT_NAME, &[STORE_MESSAGE])
            .with_vacant_witnesses()
            .with_compiled_file_assets(zk_config_path)
    }

    /// State of a freshly deployed instance
    pub fn initial_state() -> ContractState {
        let mut state = ContractState::new(vec![STORE_MESSAGE.to_string()]);
        state.data.insert(MESSAGE_FIELD.to_string(), StateValue::Null);
        state
    }

    /// Transcript of `storeMessage(message)`
    pub fn store_message(message: &str) -> Vec<StateOp> {
        vec![StateOp::Write {
            field: MESSAGE_FIELD.to_string(),
            value: StateValue::Cell(message.as_bytes().to_vec()),
        }]
    }

    /// Decoded public ledger of a Hello instance
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Ledger {
        pub message: Option<String>,
    }

    /// Decode the public ledger; an empty message reads as absent
    pub fn ledger(state: &ContractState) -> Result<Ledger> {
        let message = match state.field(MESSAGE_FIELD) {
            None | Some(StateValue::Null) => None,
            Some(StateValue::Cell(bytes)) => {
                let text = String::from_utf8(bytes.clone())
                    .map_err(|e| Error::Deserialization(format!("message field: {}", e)))?;
                Some(text).filter(|m| !m.is_empty())
            }
        };
        Ok(Ledger { message })
    }
}
