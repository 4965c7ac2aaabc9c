// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::ValidationErr;
use lazy_static::lazy_static;
use regex::Regex;
use secp256k1::{Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const PUBLIC_KEY_BYTES: usize = 33;
pub const PRIVATE_KEY_BYTES: usize = 32;

lazy_static! {
    static ref PUBLIC_KEY_RE: Regex = Regex::new(r"^(02|03)[0-9a-fA-F]{64}$").unwrap();
}

/// Compressed secp256k1 key in hex: `02` or `03` followed by 64 hex digits.
#[must_use]
pub fn is_valid_public_key(candidate: &str) -> bool {
    PUBLIC_KEY_RE.is_match(candidate)
}

/// Compressed secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_BYTES]);

impl PublicKey {
    pub fn from_hex(encoded: &str) -> Result<Self, ValidationErr> {
        if !is_valid_public_key(encoded) {
            return Err(ValidationErr::InvalidPublicKey("public_key"));
        }

        let bytes = hex::decode(encoded).map_err(|_| ValidationErr::InvalidPublicKey("public_key"))?;
        let mut out = [0; PUBLIC_KEY_BYTES];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The 32 byte x coordinate used for Schnorr keys and addresses.
    #[must_use]
    pub fn x_only(&self) -> [u8; 32] {
        let mut out = [0; 32];
        out.copy_from_slice(&self.0[1..]);
        out
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        String::serialize(&self.to_hex(), serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        PublicKey::from_hex(&string).map_err(|err| serde::de::Error::custom(err.to_string()))
    }
}

/// secp256k1 secret key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq)]
pub struct PrivateKey([u8; PRIVATE_KEY_BYTES]);

impl PrivateKey {
    pub fn from_hex(encoded: &str) -> Result<Self, ValidationErr> {
        let mut bytes = hex::decode(encoded.trim()).map_err(|_| ValidationErr::InvalidPrivateKey)?;
        let result = Self::from_slice(&bytes);
        bytes.zeroize();
        result
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationErr> {
        SecretKey::from_slice(bytes).map_err(|_| ValidationErr::InvalidPrivateKey)?;
        let mut out = [0; PRIVATE_KEY_BYTES];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    #[must_use]
    pub fn random() -> Self {
        let secret = SecretKey::new(&mut secp256k1::rand::thread_rng());
        Self(secret.secret_bytes())
    }

    pub fn public_key(&self) -> Result<PublicKey, ValidationErr> {
        let secp = Secp256k1::signing_only();
        let secret = self.secret_key()?;
        let public = secp256k1::PublicKey::from_secret_key(&secp, &secret);
        Ok(PublicKey(public.serialize()))
    }

    pub(crate) fn secret_key(&self) -> Result<SecretKey, ValidationErr> {
        SecretKey::from_slice(&self.0).map_err(|_| ValidationErr::InvalidPrivateKey)
    }

    #[must_use]
    pub(crate) fn as_bytes(&self) -> &[u8; PRIVATE_KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_validation() {
        let hex64 = "a".repeat(64);
        assert!(is_valid_public_key(&format!("02{hex64}")));
        assert!(is_valid_public_key(&format!("03{}", "AbCdEf01".repeat(8))));
        assert!(!is_valid_public_key(&format!("04{hex64}")));
        assert!(!is_valid_public_key(&format!("02{}", "a".repeat(63))));
        assert!(!is_valid_public_key(&format!("02{}", "a".repeat(65))));
        assert!(!is_valid_public_key(&format!("02{}g", "a".repeat(63))));
        assert!(!is_valid_public_key(""));
        assert!(!is_valid_public_key(&format!(" 02{hex64}")));
    }

    #[test]
    fn public_key_hex_round_trip() {
        let encoded = format!("03{}", "0123456789abcdef".repeat(4));
        let key = PublicKey::from_hex(&encoded).unwrap();
        assert_eq!(key.to_hex(), encoded);
        assert_eq!(key.x_only()[..], key.0[1..]);
        assert!(PublicKey::from_hex("02").is_err());
    }

    #[test]
    fn private_key_derives_compressed_public_key() {
        let key = PrivateKey::random();
        let public = key.public_key().unwrap();
        assert!(is_valid_public_key(&public.to_hex()));
    }

    #[test]
    fn private_key_known_vector() {
        // Secret key 1 maps to the generator point.
        let key = PrivateKey::from_hex(&format!("{}01", "00".repeat(31))).unwrap();
        assert_eq!(
            key.public_key().unwrap().to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn private_key_rejects_garbage() {
        assert_eq!(
            PrivateKey::from_hex("zz").unwrap_err(),
            ValidationErr::InvalidPrivateKey
        );
        assert_eq!(
            PrivateKey::from_hex(&"00".repeat(32)).unwrap_err(),
            ValidationErr::InvalidPrivateKey
        );
        assert_eq!(
            PrivateKey::from_hex(&"11".repeat(31)).unwrap_err(),
            ValidationErr::InvalidPrivateKey
        );
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let key = PrivateKey::random();
        assert_eq!(format!("{key:?}"), "PrivateKey(\"[REDACTED]\")");
    }
}
