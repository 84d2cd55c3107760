//! Bech32m user-facing addresses
//!
//! The human-readable part is `mn_<kind>` followed by `_<network>` on every
//! network except mainnet, e.g. `mn_addr_preprod1...`.

use bech32::{Bech32m, Hrp};

use crate::error::{Error, Result};
use crate::types::NetworkId;

/// Kind of key material an address carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Unshielded,
    Shielded,
    Dust,
}

impl AddressKind {
    fn prefix(&self) -> &'static str {
        match self {
            AddressKind::Unshielded => "addr",
            AddressKind::Shielded => "shield-addr",
            AddressKind::Dust => "dust",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "addr" => Some(AddressKind::Unshielded),
            "shield-addr" => Some(AddressKind::Shielded),
            "dust" => Some(AddressKind::Dust),
            _ => None,
        }
    }
}

/// A decoded Midnight address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidnightAddress {
    pub kind: AddressKind,
    pub network_id: NetworkId,
    pub data: Vec<u8>,
}

impl MidnightAddress {
    pub fn new(kind: AddressKind, network_id: NetworkId, data: Vec<u8>) -> Self {
        Self {
            kind,
            network_id,
            data,
        }
    }

    fn hrp_string(kind: AddressKind, network_id: NetworkId) -> String {
        match network_id {
            NetworkId::MainNet => format!("mn_{}", kind.prefix()),
            other => format!("mn_{}_{}", kind.prefix(), other.as_str()),
        }
    }

    pub fn encode(&self) -> Result<String> {
        let hrp = Hrp::parse(&Self::hrp_string(self.kind, self.network_id))
            .map_err(|e| Error::InvalidAddress(e.to_string()))?;
        bech32::encode::<Bech32m>(hrp, &self.data).map_err(|e| Error::InvalidAddress(e.to_string()))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let (hrp, data) =
            bech32::decode(encoded).map_err(|e| Error::InvalidAddress(e.to_string()))?;
        let hrp = hrp.to_lowercase();

        let rest = hrp
            .strip_prefix("mn_")
            .ok_or_else(|| Error::InvalidAddress(format!("unexpected prefix: {}", hrp)))?;

        // Kinds may contain '-' but never '_', so the first '_' splits off the network
        let (kind, network_id) = match rest.split_once('_') {
            Some((kind, network)) => (kind, network.parse::<NetworkId>()?),
            None => (rest, NetworkId::MainNet),
        };
        let kind = AddressKind::from_prefix(kind)
            .ok_or_else(|| Error::InvalidAddress(format!("unknown address kind: {}", kind)))?;

        Ok(Self {
            kind,
            network_id,
            data,
        })
    }
}
