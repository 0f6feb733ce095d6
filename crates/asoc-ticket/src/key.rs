//! Signing keys.
//!
//! HS256: HMAC-SHA-256 over the signing input, constant-time verification.
//! EdDSA: Ed25519 with strict verification; a key built from a public key
//! alone can verify but not sign.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::KeyError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum HMAC secret length in bytes.
pub const MIN_HMAC_SECRET_LEN: usize = 32;

/// Signature algorithm named in the ticket header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "HS256")]
    HS256,
    #[serde(rename = "EdDSA")]
    EdDSA,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::EdDSA => "EdDSA",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" | "hs256" => Ok(Algorithm::HS256),
            "EdDSA" | "eddsa" | "ed25519" => Ok(Algorithm::EdDSA),
            other => Err(format!("unsupported algorithm: {}", other)),
        }
    }
}

/// Key material able to sign and verify ticket signing inputs.
pub trait TicketKey: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Must not panic on arbitrary `signature` bytes.
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;
}

/// Shared-secret HS256 key.
#[derive(Clone)]
pub struct HmacKey {
    secret: Vec<u8>,
}

impl HmacKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let secret = secret.into();
        if secret.len() < MIN_HMAC_SECRET_LEN {
            return Err(KeyError::SecretTooShort {
                min: MIN_HMAC_SECRET_LEN,
                got: secret.len(),
            });
        }
        Ok(Self { secret })
    }

    /// Fresh random 32-byte secret.
    pub fn generate() -> Self {
        let mut secret = vec![0u8; MIN_HMAC_SECRET_LEN];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, KeyError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TicketKey for HmacKey {
    fn algorithm(&self) -> Algorithm {
        Algorithm::HS256
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let mut mac = self.mac()?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}

/// Ed25519 key, either a full signing key or a verify-only public key.
#[derive(Clone)]
pub struct Ed25519Key {
    signing: Option<SigningKey>,
    verifying: VerifyingKey,
}

impl Ed25519Key {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(seed);
        let verifying = signing.verifying_key();
        Self {
            signing: Some(signing),
            verifying,
        }
    }

    /// Parse a 32-byte seed given as 64 hex characters.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, KeyError> {
        let seed = decode_hex_32(seed_hex)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn verify_only(public_key: &[u8; 32]) -> Result<Self, KeyError> {
        let verifying = VerifyingKey::from_bytes(public_key)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            signing: None,
            verifying,
        })
    }

    pub fn verify_only_hex(public_key_hex: &str) -> Result<Self, KeyError> {
        let bytes = decode_hex_32(public_key_hex)?;
        Self::verify_only(&bytes)
    }

    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying.to_bytes())
    }

    /// Verify-only view of this key, for distribution to validators.
    pub fn to_verify_only(&self) -> Self {
        Self {
            signing: None,
            verifying: self.verifying,
        }
    }

    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }
}

impl std::fmt::Debug for Ed25519Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Key")
            .field("public_key", &self.public_key_hex())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

impl TicketKey for Ed25519Key {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDSA
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let signing = self.signing.as_ref().ok_or(KeyError::VerifyOnly)?;
        Ok(signing.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            Ok(signature) => self.verifying.verify_strict(message, &signature).is_ok(),
            Err(_) => false,
        }
    }
}

fn decode_hex_32(input: &str) -> Result<[u8; 32], KeyError> {
    let bytes = hex::decode(input.trim()).map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| KeyError::InvalidEncoding(format!("expected 32 bytes, got {}", b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn hmac_rejects_short_secret() {
        let err = HmacKey::new(b"short".to_vec()).unwrap_err();
        assert_eq!(err, KeyError::SecretTooShort { min: 32, got: 5 });
    }

    #[test]
    fn hmac_sign_verify() {
        let key = HmacKey::new(SECRET).unwrap();
        let sig = key.sign(b"header.payload").unwrap();
        assert_eq!(sig.len(), 32);
        assert!(key.verify(b"header.payload", &sig));
        assert!(!key.verify(b"header.payload2", &sig));
        assert!(!key.verify(b"header.payload", &sig[..31]));
    }

    #[test]
    fn hmac_debug_redacts_secret() {
        let key = HmacKey::new(SECRET).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0123456789"));
    }

    #[test]
    fn different_hmac_keys_disagree() {
        let a = HmacKey::generate();
        let b = HmacKey::generate();
        let sig = a.sign(b"msg").unwrap();
        assert!(!b.verify(b"msg", &sig));
    }

    #[test]
    fn ed25519_sign_verify() {
        let key = Ed25519Key::generate();
        let sig = key.sign(b"header.payload").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(key.verify(b"header.payload", &sig));
        assert!(!key.verify(b"tampered", &sig));
        assert!(!key.verify(b"header.payload", &[0u8; 10]));
    }

    #[test]
    fn ed25519_verify_only_cannot_sign() {
        let key = Ed25519Key::generate();
        let public = key.to_verify_only();
        assert!(!public.can_sign());
        assert_eq!(public.sign(b"msg").unwrap_err(), KeyError::VerifyOnly);

        let sig = key.sign(b"msg").unwrap();
        assert!(public.verify(b"msg", &sig));

        let from_hex = Ed25519Key::verify_only_hex(&key.public_key_hex()).unwrap();
        assert!(from_hex.verify(b"msg", &sig));
    }

    #[test]
    fn ed25519_seed_hex() {
        let seed_hex = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
        let a = Ed25519Key::from_seed_hex(seed_hex).unwrap();
        let b = Ed25519Key::from_seed_hex(seed_hex).unwrap();
        assert_eq!(a.public_key_hex(), b.public_key_hex());
        assert!(Ed25519Key::from_seed_hex("abcd").is_err());
        assert!(Ed25519Key::from_seed_hex("zz").is_err());
    }

    #[test]
    fn algorithm_wire_names() {
        assert_eq!(serde_json::to_string(&Algorithm::HS256).unwrap(), "\"HS256\"");
        assert_eq!(serde_json::to_string(&Algorithm::EdDSA).unwrap(), "\"EdDSA\"");
        assert!(serde_json::from_str::<Algorithm>("\"none\"").is_err());
        assert_eq!("ed25519".parse::<Algorithm>().unwrap(), Algorithm::EdDSA);
    }
}
