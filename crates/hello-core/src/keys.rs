//! Role-specific key material derived from HD secrets

use std::fmt;

use k256::schnorr::{signature::Signer, SigningKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::{AddressKind, MidnightAddress};
use crate::crypto::tagged_hash;
use crate::error::{Error, Result};
use crate::types::{hex_bytes_32, NetworkId, Signature, UnshieldedPublicKey};

/// Shielded coin public key (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinPublicKey(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl CoinPublicKey {
    pub fn to_hex_string(&self) -> String {
        hex::encode(self.0)
    }
}

/// Shielded encryption public key (compressed secp256k1 point)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncryptionPublicKey(pub [u8; 33]);

impl EncryptionPublicKey {
    pub fn to_hex_string(&self) -> String {
        hex::encode(self.0)
    }
}

/// Secret keys for the shielded (Zswap) sub-wallet
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ShieldedSecretKeys {
    coin_secret_key: [u8; 32],
    encryption_secret_key: [u8; 32],
}

impl ShieldedSecretKeys {
    /// Expand a Zswap role secret into coin and encryption keys
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self> {
        let coin_secret_key = tagged_hash("midnight:zswap:coin-sk", &[seed]);
        let encryption_secret_key = tagged_hash("midnight:zswap:enc-sk", &[seed]);

        // Reject the (negligible) case of an out-of-range scalar up front
        k256::SecretKey::from_slice(&encryption_secret_key)
            .map_err(|e| Error::KeyDerivation(format!("encryption key: {}", e)))?;

        Ok(Self {
            coin_secret_key,
            encryption_secret_key,
        })
    }

    pub fn coin_public_key(&self) -> CoinPublicKey {
        CoinPublicKey(tagged_hash("midnight:zswap:coin-pk", &[&self.coin_secret_key]))
    }

    pub fn encryption_public_key(&self) -> Result<EncryptionPublicKey> {
        let secret = k256::SecretKey::from_slice(&self.encryption_secret_key)
            .map_err(|e| Error::KeyDerivation(format!("encryption key: {}", e)))?;
        let encoded = k256::elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(
            &secret.public_key(),
            true,
        );
        let bytes: [u8; 33] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::KeyDerivation("bad encryption key encoding".to_string()))?;
        Ok(EncryptionPublicKey(bytes))
    }

    /// Bech32m shielded address (coin public key || encryption public key)
    pub fn address(&self, network_id: NetworkId) -> Result<String> {
        let mut data = self.coin_public_key().0.to_vec();
        data.extend_from_slice(&self.encryption_public_key()?.0);
        MidnightAddress::new(AddressKind::Shielded, network_id, data).encode()
    }
}

impl fmt::Debug for ShieldedSecretKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedSecretKeys")
            .field("coin_public_key", &self.coin_public_key().to_hex_string())
            .finish_non_exhaustive()
    }
}

/// Public half of a [`DustSecretKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, bitcode::Encode, bitcode::Decode)]
pub struct DustPublicKey(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl DustPublicKey {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn address(&self, network_id: NetworkId) -> Result<String> {
        MidnightAddress::new(AddressKind::Dust, network_id, self.0.to_vec()).encode()
    }
}

/// Secret key for the DUST sub-wallet
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DustSecretKey([u8; 32]);

impl DustSecretKey {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(tagged_hash("midnight:dust:sk", &[seed]))
    }

    pub fn public_key(&self) -> DustPublicKey {
        DustPublicKey(tagged_hash("midnight:dust:pk", &[&self.0]))
    }
}

impl fmt::Debug for DustSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DustSecretKey")
            .field(&self.public_key().to_hex())
            .finish()
    }
}

/// Signing key store for unshielded (NIGHT) coins
#[derive(Clone)]
pub struct UnshieldedKeystore {
    signing_key: SigningKey,
    network_id: NetworkId,
}

impl UnshieldedKeystore {
    /// Build a keystore from the NightExternal role secret
    pub fn new(secret: &[u8; 32], network_id: NetworkId) -> Result<Self> {
        let signing_key = SigningKey::from_bytes(secret)
            .map_err(|e| Error::KeyDerivation(format!("unshielded key: {}", e)))?;
        Ok(Self {
            signing_key,
            network_id,
        })
    }

    pub fn public_key(&self) -> UnshieldedPublicKey {
        UnshieldedPublicKey::new(self.signing_key.verifying_key().to_bytes().into())
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    /// Sign an arbitrary payload (BIP-340)
    pub fn sign_data(&self, payload: &[u8]) -> Result<Signature> {
        let signature: k256::schnorr::Signature = self
            .signing_key
            .try_sign(payload)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(Signature::new(signature.to_bytes()))
    }

    /// Bech32m unshielded address
    pub fn bech32_address(&self) -> Result<String> {
        MidnightAddress::new(
            AddressKind::Unshielded,
            self.network_id,
            self.public_key().0.to_vec(),
        )
        .encode()
    }
}

impl fmt::Debug for UnshieldedKeystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnshieldedKeystore")
            .field("public_key", &self.public_key().to_hex())
            .field("network_id", &self.network_id)
            .finish()
    }
}
