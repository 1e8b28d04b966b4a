/*
[INPUT]:  Logon payload bytes and a private signing credential
[OUTPUT]: Hex-encoded signatures for the trading logon
[POS]:    Auth layer - pluggable signing capability
[UPDATE]: When changing signing algorithm or key format
*/

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;

use crate::error::{Result, XenaError};

/// Signs the logon payload; the venue receives the returned string as the password
pub trait LogonSigner: Send + Sync {
    fn sign(&self, payload: &[u8]) -> Result<String>;
}

/// Ed25519 logon signer, signatures hex-encoded
#[derive(Debug)]
pub struct Ed25519LogonSigner {
    signing_key: SigningKey,
}

impl Ed25519LogonSigner {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32 bytes)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Create signer from a hex-encoded 32 byte secret
    pub fn from_secret_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim_start_matches("0x"))
            .map_err(|err| XenaError::Signing(format!("invalid secret hex: {err}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            XenaError::Signing(format!("secret must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_secret_key(&bytes))
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }
}

impl LogonSigner for Ed25519LogonSigner {
    fn sign(&self, payload: &[u8]) -> Result<String> {
        Ok(hex::encode(self.signing_key.sign(payload).to_bytes()))
    }
}

/// Mock signer for testing, returns a fixed signature
#[derive(Debug, Clone)]
pub struct MockLogonSigner {
    signature: String,
}

impl MockLogonSigner {
    pub fn new(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
        }
    }
}

impl LogonSigner for MockLogonSigner {
    fn sign(&self, _payload: &[u8]) -> Result<String> {
        Ok(self.signature.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = Ed25519LogonSigner::generate();
        let payload = b"AUTH1561000000000000000";
        let signature_hex = signer.sign(payload).unwrap();
        let bytes: [u8; 64] = hex::decode(&signature_hex).unwrap().try_into().unwrap();
        assert!(signer.verify(payload, &Signature::from_bytes(&bytes)));
    }

    #[test]
    fn test_from_secret_hex() {
        let original = Ed25519LogonSigner::generate();
        let secret = hex::encode(original.signing_key.to_bytes());
        let restored = Ed25519LogonSigner::from_secret_hex(&secret).unwrap();
        assert_eq!(original.public_key_hex(), restored.public_key_hex());
    }

    #[test]
    fn test_from_secret_hex_rejects_short_key() {
        let err = Ed25519LogonSigner::from_secret_hex("abcd").unwrap_err();
        assert!(matches!(err, XenaError::Signing(_)));
    }

    #[test]
    fn test_mock_signer() {
        let signer = MockLogonSigner::new("deadbeef");
        assert_eq!(signer.sign(b"anything").unwrap(), "deadbeef");
    }
}
