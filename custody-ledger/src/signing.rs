//! Per-actor Ed25519 signing, isolated behind a [`Signer`] trait so a
//! hardware-backed or remote signer can later stand in for the prototype
//! file-backed implementation without touching the ledger core.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::LedgerError;

/// Abstraction over "sign on behalf of this user" so the ledger core never
/// has to know how or where private keys live.
pub trait Signer {
    /// Returns the base64-encoded raw 32-byte Ed25519 public key for `user_id`,
    /// creating a keypair on first use.
    fn public_key_b64(&mut self, user_id: &str) -> Result<String, LedgerError>;

    /// Signs `payload` on behalf of `user_id`, returning the base64-encoded
    /// 64-byte signature. Creates a keypair on first use.
    fn sign(&mut self, user_id: &str, payload: &[u8]) -> Result<String, LedgerError>;
}

/// Prototype key manager: one unencrypted PKCS#8 PEM private key per user,
/// held by the custody service on the user's behalf. A deliberate prototype
/// simplification, not a recommended production key-custody model.
pub struct Ed25519FileSigner {
    keys_dir: PathBuf,
    cache: HashMap<String, SigningKey>,
}

impl Ed25519FileSigner {
    /// Creates a signer rooted at `<base_dir>/data/keys`.
    pub fn new(base_dir: &Path) -> Result<Self, LedgerError> {
        let keys_dir = base_dir.join("data").join("keys");
        fs::create_dir_all(&keys_dir)?;
        Ok(Self {
            keys_dir,
            cache: HashMap::new(),
        })
    }

    fn key_path(&self, user_id: &str) -> PathBuf {
        self.keys_dir.join(format!("{user_id}.ed25519.pem"))
    }

    fn load_or_create(&mut self, user_id: &str) -> Result<&SigningKey, LedgerError> {
        if !self.cache.contains_key(user_id) {
            let path = self.key_path(user_id);
            let key = if path.exists() {
                let pem = fs::read_to_string(&path)?;
                SigningKey::from_pkcs8_pem(&pem)
                    .map_err(|e| LedgerError::CryptoFailure(format!("load key: {e}")))?
            } else {
                let key = SigningKey::generate(&mut OsRng);
                let pem = key
                    .to_pkcs8_pem(Default::default())
                    .map_err(|e| LedgerError::CryptoFailure(format!("encode key: {e}")))?;
                atomic_write(&path, pem.as_bytes())?;
                key
            };
            self.cache.insert(user_id.to_string(), key);
        }
        Ok(self.cache.get(user_id).expect("just inserted"))
    }
}

impl Signer for Ed25519FileSigner {
    fn public_key_b64(&mut self, user_id: &str) -> Result<String, LedgerError> {
        let key = self.load_or_create(user_id)?;
        Ok(BASE64.encode(key.verifying_key().to_bytes()))
    }

    fn sign(&mut self, user_id: &str, payload: &[u8]) -> Result<String, LedgerError> {
        let key = self.load_or_create(user_id)?;
        let sig: Signature = key.sign(payload);
        Ok(BASE64.encode(sig.to_bytes()))
    }
}

/// Verifies an Ed25519 signature. Any decode or verification failure is
/// treated as `false`, never as an error — a signature either checks out or
/// it doesn't.
pub fn verify_signature(pubkey_b64: &str, signature_b64: &str, payload: &[u8]) -> bool {
    let try_verify = || -> Result<bool, ()> {
        let pub_raw = BASE64.decode(pubkey_b64).map_err(|_| ())?;
        let sig_raw = BASE64.decode(signature_b64).map_err(|_| ())?;
        let pub_bytes: [u8; 32] = pub_raw.try_into().map_err(|_| ())?;
        let sig_bytes: [u8; 64] = sig_raw.try_into().map_err(|_| ())?;
        let verifying_key = VerifyingKey::from_bytes(&pub_bytes).map_err(|_| ())?;
        let signature = Signature::from_bytes(&sig_bytes);
        Ok(verifying_key.verify(payload, &signature).is_ok())
    };
    try_verify().unwrap_or(false)
}

/// Writes `bytes` to `path` atomically: write to a sibling temp file, then
/// rename into place, so a crash mid-write never leaves a partial key file.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
