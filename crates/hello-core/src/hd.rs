//! Hierarchical Deterministic (HD) key derivation for wallet roles
//!
//! Keys are derived along `m/44'/2400'/account'/role/index`, one secret per
//! role. The master key is held only for the lifetime of the [`HdWallet`].

use std::collections::BTreeMap;

use bip32::{ChildNumber, XPrv};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::COIN_TYPE;

/// Key role within an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    NightExternal = 0,
    NightInternal = 1,
    Dust = 2,
    Zswap = 3,
    Metadata = 4,
}

impl Role {
    pub fn index(&self) -> u32 {
        *self as u32
    }
}

/// HD wallet rooted at a BIP-32 master key
pub struct HdWallet {
    master: XPrv,
}

impl HdWallet {
    /// Create from raw seed bytes (16, 32 or 64 bytes)
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let master = XPrv::new(seed).map_err(|_| Error::InvalidSeed)?;
        Ok(Self { master })
    }

    /// Select an account (hardened)
    pub fn select_account(&self, account: u32) -> AccountSelection<'_> {
        AccountSelection {
            wallet: self,
            account,
        }
    }

    /// Drop the master key
    pub fn clear(self) {}

    fn derive(&self, account: u32, role: Role, index: u32) -> Result<[u8; 32]> {
        let path = [
            (44, true),
            (COIN_TYPE, true),
            (account, true),
            (role.index(), false),
            (index, false),
        ];

        let mut key = self.master.clone();
        for (value, hardened) in path {
            let child = ChildNumber::new(value, hardened)
                .map_err(|e| Error::KeyDerivation(e.to_string()))?;
            key = key
                .derive_child(child)
                .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        }

        Ok(key.private_key().to_bytes().into())
    }
}

/// An account chosen on an [`HdWallet`]
pub struct AccountSelection<'a> {
    wallet: &'a HdWallet,
    account: u32,
}

impl<'a> AccountSelection<'a> {
    /// Choose the roles to derive keys for
    pub fn select_roles(self, roles: &[Role]) -> RoleSelection<'a> {
        RoleSelection {
            wallet: self.wallet,
            account: self.account,
            roles: roles.to_vec(),
        }
    }
}

/// Roles chosen within an account
pub struct RoleSelection<'a> {
    wallet: &'a HdWallet,
    account: u32,
    roles: Vec<Role>,
}

impl RoleSelection<'_> {
    /// Derive one secret per selected role at the given address index
    pub fn derive_keys_at(&self, index: u32) -> Result<DerivedKeys> {
        let mut keys = BTreeMap::new();
        for role in &self.roles {
            let secret = self.wallet.derive(self.account, *role, index)?;
            keys.insert(*role, secret);
        }
        Ok(DerivedKeys { keys })
    }
}

/// Secrets derived for each selected role, zeroized on drop
pub struct DerivedKeys {
    keys: BTreeMap<Role, [u8; 32]>,
}

impl DerivedKeys {
    /// Secret for a role that was selected before derivation
    pub fn get(&self, role: Role) -> Result<&[u8; 32]> {
        self.keys
            .get(&role)
            .ok_or_else(|| Error::KeyDerivation(format!("role {:?} was not derived", role)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Zeroize for DerivedKeys {
    fn zeroize(&mut self) {
        for secret in self.keys.values_mut() {
            secret.zeroize();
        }
    }
}

impl Drop for DerivedKeys {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for DerivedKeys {}

/// Generate a fresh 32-byte wallet seed
pub fn generate_random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Zswap, Role::NightExternal, Role::Dust];

    #[test]
    fn test_invalid_seed_length() {
        assert!(matches!(HdWallet::from_seed(&[1u8; 5]), Err(Error::InvalidSeed)));
        assert!(matches!(HdWallet::from_seed(&[]), Err(Error::InvalidSeed)));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = [0x42u8; 32];
        let a = HdWallet::from_seed(&seed).unwrap();
        let b = HdWallet::from_seed(&seed).unwrap();

        let keys_a = a.select_account(0).select_roles(&ROLES).derive_keys_at(0).unwrap();
        let keys_b = b.select_account(0).select_roles(&ROLES).derive_keys_at(0).unwrap();

        for role in ROLES {
            assert_eq!(keys_a.get(role).unwrap(), keys_b.get(role).unwrap());
        }
    }

    #[test]
    fn test_roles_and_indices_differ() {
        let wallet = HdWallet::from_seed(&[9u8; 32]).unwrap();
        let at0 = wallet.select_account(0).select_roles(&ROLES).derive_keys_at(0).unwrap();
        let at1 = wallet.select_account(0).select_roles(&ROLES).derive_keys_at(1).unwrap();

        assert_ne!(at0.get(Role::Zswap).unwrap(), at0.get(Role::Dust).unwrap());
        assert_ne!(at0.get(Role::Zswap).unwrap(), at1.get(Role::Zswap).unwrap());
        assert_eq!(at0.len(), 3);
    }

    #[test]
    fn test_unselected_role_errors() {
        let wallet = HdWallet::from_seed(&[3u8; 16]).unwrap();
        let keys = wallet
            .select_account(0)
            .select_roles(&[Role::Dust])
            .derive_keys_at(0)
            .unwrap();
        assert!(keys.get(Role::Metadata).is_err());
        wallet.clear();
    }

    #[test]
    fn test_random_seeds_differ() {
        assert_ne!(generate_random_seed(), generate_random_seed());
    }
}
