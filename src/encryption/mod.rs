//! Standard security handler (ISO 32000-1:2008, Section 7.6.3).
//!
//! Supports revisions 2-4: RC4 with 40-128 bit keys and the AESV2 crypt
//! filter. Revision 5/6 (AES-256) documents are reported as unsupported;
//! the caller-supplied passphrase contract only covers documents this
//! handler can actually unlock.

mod aes;
mod rc4;

pub use aes::{aes128_decrypt, aes128_encrypt};
pub use rc4::rc4_crypt;

use crate::error::{Error, Result};
use crate::object::{Dict, ObjRef, Object};
use md5::{Digest, Md5};

/// Password padding string (Algorithm 2, step a).
const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// Per-object crypt method resolved from `/CF` / `/StmF` / `/StrF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    /// No transformation
    Identity,
    /// RC4 with the object key
    Rc4,
    /// AES-128-CBC with leading IV
    Aes128,
}

/// Decryption state for one document.
#[derive(Debug)]
pub struct EncryptionHandler {
    revision: u32,
    key_length: usize,
    owner_hash: Vec<u8>,
    user_hash: Vec<u8>,
    permissions: i32,
    file_id: Vec<u8>,
    encrypt_metadata: bool,
    stream_method: CryptMethod,
    string_method: CryptMethod,
    file_key: Option<Vec<u8>>,
}

impl EncryptionHandler {
    /// Build a handler from the trailer's `/Encrypt` dictionary.
    pub fn new(encrypt: &Dict, file_id: Vec<u8>) -> Result<Self> {
        let filter = encrypt.get("Filter").and_then(Object::as_name).unwrap_or("");
        if filter != "Standard" {
            return Err(Error::Unsupported(format!("security handler '{}'", filter)));
        }

        let version = encrypt.get("V").and_then(Object::as_integer).unwrap_or(0);
        let revision = encrypt.get("R").and_then(Object::as_integer).unwrap_or(2) as u32;
        if revision >= 5 {
            return Err(Error::Unsupported("AES-256 encryption (revision 5/6)".to_string()));
        }

        let key_length = match version {
            1 => 5,
            2 | 4 => {
                (encrypt.get("Length").and_then(Object::as_integer).unwrap_or(40) / 8) as usize
            },
            other => {
                return Err(Error::Unsupported(format!("encryption version {}", other)));
            },
        };

        let owner_hash = encrypt
            .get("O")
            .and_then(Object::as_string)
            .ok_or_else(|| Error::Encrypted("missing /O entry".to_string()))?
            .to_vec();
        let user_hash = encrypt
            .get("U")
            .and_then(Object::as_string)
            .ok_or_else(|| Error::Encrypted("missing /U entry".to_string()))?
            .to_vec();
        let permissions = encrypt.get("P").and_then(Object::as_integer).unwrap_or(-1) as i32;
        let encrypt_metadata = encrypt
            .get("EncryptMetadata")
            .and_then(Object::as_bool)
            .unwrap_or(true);

        // V4 names crypt filters; V1/V2 are always RC4
        let (stream_method, string_method) = if version == 4 {
            let method_of = |name: Option<&str>| -> CryptMethod {
                match name {
                    Some("Identity") | None => CryptMethod::Identity,
                    other => {
                        let cfm = encrypt
                            .get("CF")
                            .and_then(Object::as_dict)
                            .and_then(|cf| cf.get(other.unwrap_or("")))
                            .and_then(Object::as_dict)
                            .and_then(|f| f.get("CFM"))
                            .and_then(Object::as_name);
                        match cfm {
                            Some("AESV2") => CryptMethod::Aes128,
                            Some("V2") => CryptMethod::Rc4,
                            _ => CryptMethod::Identity,
                        }
                    },
                }
            };
            (
                method_of(encrypt.get("StmF").and_then(Object::as_name)),
                method_of(encrypt.get("StrF").and_then(Object::as_name)),
            )
        } else {
            (CryptMethod::Rc4, CryptMethod::Rc4)
        };

        Ok(Self {
            revision,
            key_length,
            owner_hash,
            user_hash,
            permissions,
            file_id,
            encrypt_metadata,
            stream_method,
            string_method,
            file_key: None,
        })
    }

    /// Try a passphrase as user password, then as owner password.
    ///
    /// Returns `true` and retains the file key on success.
    pub fn authenticate(&mut self, password: &[u8]) -> bool {
        if let Some(key) = self.try_user_password(password) {
            self.file_key = Some(key);
            return true;
        }
        // Algorithm 7: recover the user password by peeling the owner hash
        let user_password = self.user_password_from_owner(password);
        if let Some(key) = self.try_user_password(&user_password) {
            log::debug!("authenticated with owner password");
            self.file_key = Some(key);
            return true;
        }
        false
    }

    /// Whether a successful authentication has occurred.
    pub fn is_authenticated(&self) -> bool {
        self.file_key.is_some()
    }

    /// Decrypt stream payload bytes for the given object.
    pub fn decrypt_stream(&self, data: &[u8], obj: ObjRef) -> Result<Vec<u8>> {
        self.apply(self.stream_method, data, obj, false)
    }

    /// Decrypt string bytes for the given object.
    pub fn decrypt_string(&self, data: &[u8], obj: ObjRef) -> Result<Vec<u8>> {
        self.apply(self.string_method, data, obj, false)
    }

    /// Re-encrypt string bytes, for objects rewritten in an incremental
    /// update.
    pub fn encrypt_string(&self, data: &[u8], obj: ObjRef) -> Result<Vec<u8>> {
        self.apply(self.string_method, data, obj, true)
    }

    fn apply(&self, method: CryptMethod, data: &[u8], obj: ObjRef, encrypt: bool) -> Result<Vec<u8>> {
        let key = self
            .file_key
            .as_ref()
            .ok_or_else(|| Error::Encrypted("not authenticated".to_string()))?;
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::Rc4 => Ok(rc4_crypt(&self.object_key(key, obj, false), data)),
            CryptMethod::Aes128 => {
                let object_key = self.object_key(key, obj, true);
                if encrypt {
                    aes128_encrypt(&object_key, &derive_iv(obj), data)
                } else {
                    aes128_decrypt(&object_key, data)
                }
            },
        }
    }

    /// Per-object key (Algorithm 1): MD5 of the file key, the low bytes of
    /// the object identity, and the AES salt when applicable.
    fn object_key(&self, file_key: &[u8], obj: ObjRef, aes: bool) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(file_key);
        hasher.update(&obj.number.to_le_bytes()[..3]);
        hasher.update(&obj.generation.to_le_bytes()[..2]);
        if aes {
            hasher.update(b"sAlT");
        }
        let digest = hasher.finalize();
        let len = (file_key.len() + 5).min(16);
        digest[..len].to_vec()
    }

    /// Algorithm 2: derive the file key from a padded password.
    fn compute_file_key(&self, password: &[u8]) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(pad_password(password));
        hasher.update(&self.owner_hash);
        hasher.update(self.permissions.to_le_bytes());
        hasher.update(&self.file_id);
        if self.revision >= 4 && !self.encrypt_metadata {
            hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let mut digest = hasher.finalize().to_vec();

        if self.revision >= 3 {
            for _ in 0..50 {
                let mut hasher = Md5::new();
                hasher.update(&digest[..self.key_length.min(16)]);
                digest = hasher.finalize().to_vec();
            }
        }
        digest[..self.key_length.min(16)].to_vec()
    }

    /// Algorithms 4/5: validate a user password, returning the file key.
    fn try_user_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_file_key(password);
        let expected = if self.revision >= 3 {
            let mut hasher = Md5::new();
            hasher.update(PADDING);
            hasher.update(&self.file_id);
            let mut hash = hasher.finalize().to_vec();
            for i in 0..20u8 {
                let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                hash = rc4_crypt(&round_key, &hash);
            }
            hash
        } else {
            rc4_crypt(&key, &PADDING)
        };

        let compare_len = if self.revision >= 3 { 16 } else { 32 };
        if self.user_hash.len() >= compare_len
            && constant_time_eq(&self.user_hash[..compare_len], &expected[..compare_len])
        {
            Some(key)
        } else {
            None
        }
    }

    /// Algorithm 7 (first half): decrypt `/O` with the owner-derived key to
    /// recover the padded user password.
    fn user_password_from_owner(&self, owner_password: &[u8]) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(pad_password(owner_password));
        let mut digest = hasher.finalize().to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                let mut hasher = Md5::new();
                hasher.update(&digest[..self.key_length.min(16)]);
                digest = hasher.finalize().to_vec();
            }
        }
        let rc4_key = &digest[..self.key_length.min(16)];

        if self.revision >= 3 {
            let mut result = self.owner_hash.clone();
            for i in (0..20u8).rev() {
                let round_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
                result = rc4_crypt(&round_key, &result);
            }
            result
        } else {
            rc4_crypt(rc4_key, &self.owner_hash)
        }
    }
}

/// Pad or truncate a password to 32 bytes (Algorithm 2, step a).
fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

/// Deterministic IV from the object identity; uniqueness per object is all
/// AES-CBC needs here.
fn derive_iv(obj: ObjRef) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(obj.number.to_le_bytes());
    hasher.update(obj.generation.to_le_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hasher.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
