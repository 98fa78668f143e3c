//! AES-128-CBC for the AESV2 crypt filter.
//!
//! Per ISO 32000-1:2008, Section 7.6.2: the first 16 bytes of the payload
//! are the initialization vector, the rest is PKCS#7-padded ciphertext.

use crate::error::{Error, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Decrypt an AESV2 payload (leading IV, PKCS#7 padding).
pub fn aes128_decrypt(key: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(Error::Encrypted(format!("AES key length {} != 16", key.len())));
    }
    if payload.len() < 16 || (payload.len() - 16) % 16 != 0 {
        return Err(Error::Encrypted("AES payload not block aligned".to_string()));
    }
    let (iv, ciphertext) = payload.split_at(16);
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Encrypted("AES padding invalid (wrong key?)".to_string()))
}

/// Encrypt a payload for AESV2, prepending the given IV.
pub fn aes128_encrypt(key: &[u8], iv: &[u8; 16], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(Error::Encrypted(format!("AES key length {} != 16", key.len())));
    }
    let ciphertext =
        Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mut out = Vec::with_capacity(16 + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let key = [7u8; 16];
        let iv = [3u8; 16];
        let plain = b"radio group title";
        let payload = aes128_encrypt(&key, &iv, plain).unwrap();
        assert_eq!(&payload[..16], &iv);
        assert_eq!(aes128_decrypt(&key, &payload).unwrap(), plain);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let payload = aes128_encrypt(&[7u8; 16], &[3u8; 16], b"secret").unwrap();
        assert!(aes128_decrypt(&[8u8; 16], &payload).is_err());
    }

    #[test]
    fn test_short_payload_rejected() {
        assert!(aes128_decrypt(&[0u8; 16], &[0u8; 8]).is_err());
    }
}
