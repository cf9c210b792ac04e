//! Optional envelope encryption for stored evidence payloads.
//!
//! Construction: AES-128-CBC for confidentiality, HMAC-SHA256 for
//! integrity, composed encrypt-then-MAC (the MAC covers the IV and
//! ciphertext; MAC-then-encrypt is forbidden by the design this
//! implements). Ciphertext on disk is prefixed with the literal bytes
//! `TSENC1:` so legacy plaintext payloads remain readable.

use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::hash::sha256_bytes;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Prefix marking a stored payload as envelope-encrypted.
const ENC_PREFIX: &[u8] = b"TSENC1:";

const IV_LEN: usize = 16;
const MAC_LEN: usize = 32;
const KEY_LEN: usize = 32;

/// Reports whether encryption is enabled and identifies the key in use,
/// without ever exposing key material.
#[derive(Debug, Clone)]
pub struct EvidenceEncryptionStatus {
    pub enabled: bool,
    pub algorithm: &'static str,
    pub key_path: String,
    pub key_fingerprint_sha256: String,
}

/// Envelope cipher for evidence payloads at rest.
pub struct EvidenceCipher {
    key_path: PathBuf,
    aes_key: [u8; 16],
    mac_key: [u8; 32],
    key_fingerprint: String,
}

impl EvidenceCipher {
    /// Loads the symmetric key from `<base_dir>/data/keys/evidence.fernet.key`,
    /// generating and persisting one on first use.
    pub fn new(base_dir: &Path) -> Result<Self, LedgerError> {
        let key_path = base_dir.join("data").join("keys").join("evidence.fernet.key");
        if let Some(parent) = key_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw_key = Self::load_or_create_key(&key_path)?;
        let (aes_key, mac_key) = derive_subkeys(&raw_key);
        let key_fingerprint = sha256_bytes(&raw_key);

        Ok(Self {
            key_path,
            aes_key,
            mac_key,
            key_fingerprint,
        })
    }

    fn load_or_create_key(key_path: &Path) -> Result<[u8; KEY_LEN], LedgerError> {
        if key_path.exists() {
            let encoded = fs::read_to_string(key_path)?;
            let decoded = base64_url_decode(encoded.trim())
                .map_err(|e| LedgerError::CryptoFailure(format!("decode evidence key: {e}")))?;
            decoded
                .try_into()
                .map_err(|_| LedgerError::CryptoFailure("evidence key has wrong length".into()))
        } else {
            let mut key = [0u8; KEY_LEN];
            OsRng.fill_bytes(&mut key);
            let encoded = base64_url_encode(&key);
            fs::write(key_path, encoded.as_bytes())?;
            Ok(key)
        }
    }

    /// Encrypts `plaintext` for storage, prefixing the result with
    /// [`ENC_PREFIX`].
    pub fn encrypt_for_storage(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes128CbcEnc::new(&self.aes_key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut mac = HmacSha256::new_from_slice(&self.mac_key).expect("hmac accepts any key length");
        mac.update(&iv);
        mac.update(&ciphertext);
        let tag = mac.finalize().into_bytes();

        let mut out = Vec::with_capacity(ENC_PREFIX.len() + IV_LEN + ciphertext.len() + MAC_LEN);
        out.extend_from_slice(ENC_PREFIX);
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        out.extend_from_slice(&tag);
        out
    }

    /// Decrypts a payload previously produced by [`Self::encrypt_for_storage`].
    /// Bytes without the `TSENC1:` prefix pass through unchanged, for
    /// backward compatibility with legacy plaintext evidence files.
    pub fn decrypt_from_storage(&self, data: &[u8]) -> Result<Vec<u8>, LedgerError> {
        let Some(rest) = data.strip_prefix(ENC_PREFIX) else {
            return Ok(data.to_vec());
        };

        if rest.len() < IV_LEN + MAC_LEN {
            return Err(LedgerError::CryptoFailure("ciphertext too short".into()));
        }
        let (iv, rest) = rest.split_at(IV_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - MAC_LEN);

        let mut mac = HmacSha256::new_from_slice(&self.mac_key).expect("hmac accepts any key length");
        mac.update(iv);
        mac.update(ciphertext);
        mac.verify_slice(tag)
            .map_err(|_| LedgerError::CryptoFailure("unable to decrypt evidence payload: MAC mismatch".into()))?;

        let iv_arr: [u8; IV_LEN] = iv.try_into().expect("checked length");
        Aes128CbcDec::new(&self.aes_key.into(), &iv_arr.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| LedgerError::CryptoFailure(format!("unable to decrypt evidence payload: {e}")))
    }

    /// Reports the current encryption configuration, for diagnostics.
    pub fn status(&self) -> EvidenceEncryptionStatus {
        EvidenceEncryptionStatus {
            enabled: true,
            algorithm: "AES-128-CBC + HMAC-SHA256 (encrypt-then-MAC)",
            key_path: self.key_path.display().to_string(),
            key_fingerprint_sha256: self.key_fingerprint.clone(),
        }
    }
}

/// Derives independent AES and HMAC subkeys from one stored secret via
/// domain-separated SHA-256, so a single 32-byte key on disk still backs
/// two primitives with no key reuse between them.
fn derive_subkeys(raw_key: &[u8; KEY_LEN]) -> ([u8; 16], [u8; 32]) {
    let aes_full = sha256_raw(&[b"TSENC1:aes:", raw_key.as_slice()].concat());
    let mac_full = sha256_raw(&[b"TSENC1:mac:", raw_key.as_slice()].concat());
    let mut aes_key = [0u8; 16];
    aes_key.copy_from_slice(&aes_full[..16]);
    (aes_key, mac_full)
}

fn sha256_raw(data: &[u8]) -> [u8; 32] {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn base64_url_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE.encode(bytes)
}

fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = EvidenceCipher::new(dir.path()).unwrap();

        let plaintext = b"sensitive evidence payload bytes";
        let ciphertext = cipher.encrypt_for_storage(plaintext);

        assert!(ciphertext.starts_with(ENC_PREFIX));
        assert!(!contains_subslice(&ciphertext, plaintext));

        let decrypted = cipher.decrypt_from_storage(&ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn legacy_plaintext_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = EvidenceCipher::new(dir.path()).unwrap();

        let plaintext = b"legacy unencrypted payload";
        let decrypted = cipher.decrypt_from_storage(plaintext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn tampered_ciphertext_fails_mac() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = EvidenceCipher::new(dir.path()).unwrap();

        let mut ciphertext = cipher.encrypt_for_storage(b"payload");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let result = cipher.decrypt_from_storage(&ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn key_persists_across_cipher_instances() {
        let dir = tempfile::tempdir().unwrap();
        let fp1 = EvidenceCipher::new(dir.path()).unwrap().status().key_fingerprint_sha256;
        let fp2 = EvidenceCipher::new(dir.path()).unwrap().status().key_fingerprint_sha256;
        assert_eq!(fp1, fp2);
    }

    fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }
}
