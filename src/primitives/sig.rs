// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{PrivateKey, PublicKey};
use blake2::digest::consts::U32;
use blake2::digest::Mac;
use blake2::Blake2bMac;
use rand::Rng;
use secp256k1::schnorr::Signature as SchnorrSignature;
use secp256k1::{Keypair, Message, Secp256k1, XOnlyPublicKey};
use std::fmt;

/// Key of the keyed BLAKE2b hash applied to personal messages before signing.
const PERSONAL_MESSAGE_HASH_KEY: &[u8] = b"PersonalMessageSigningHash";

pub const SIGNATURE_BYTES: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureErr {
    InvalidPrivateKey,
    InvalidPublicKey,
    InvalidSignature,
    HashFailure,
}

impl fmt::Display for SignatureErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidPrivateKey => "invalid private key",
            Self::InvalidPublicKey => "invalid public key",
            Self::InvalidSignature => "invalid signature",
            Self::HashFailure => "could not hash message",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for SignatureErr {}

/// BLAKE2b-256 of the message keyed with the personal message domain.
pub fn personal_message_hash(message: &[u8]) -> Result<[u8; 32], SignatureErr> {
    let mut mac = <Blake2bMac<U32> as Mac>::new_from_slice(PERSONAL_MESSAGE_HASH_KEY)
        .map_err(|_| SignatureErr::HashFailure)?;
    mac.update(message);
    let mut out = [0; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// What gets signed, with which key and whether auxiliary randomness is
/// mixed in. Consumed by [`SigningEnvelope::sign`].
pub struct SigningEnvelope<'a> {
    message: &'a [u8],
    key: &'a PrivateKey,
    aux_rand: bool,
}

impl<'a> SigningEnvelope<'a> {
    #[must_use]
    pub fn new(message: &'a str, key: &'a PrivateKey) -> Self {
        Self {
            message: message.as_bytes(),
            key,
            aux_rand: true,
        }
    }

    /// Deterministic signatures. Only useful for test vectors.
    #[must_use]
    pub fn without_aux_rand(mut self) -> Self {
        self.aux_rand = false;
        self
    }

    /// Signs the message, returning the 64 byte BIP-340 signature as hex.
    pub fn sign(self) -> Result<String, SignatureErr> {
        let secp = Secp256k1::signing_only();
        let digest = personal_message_hash(self.message)?;
        let message = Message::from_digest(digest);
        let keypair = Keypair::from_seckey_slice(&secp, self.key.as_bytes())
            .map_err(|_| SignatureErr::InvalidPrivateKey)?;

        let signature = if self.aux_rand {
            let aux: [u8; 32] = rand::thread_rng().gen();
            secp.sign_schnorr_with_aux_rand(&message, &keypair, &aux)
        } else {
            secp.sign_schnorr_no_aux_rand(&message, &keypair)
        };

        // Display renders the 64 bytes as lowercase hex.
        Ok(signature.to_string())
    }
}

impl fmt::Debug for SigningEnvelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningEnvelope")
            .field("message", &String::from_utf8_lossy(self.message))
            .field("key", &self.key)
            .field("aux_rand", &self.aux_rand)
            .finish()
    }
}

/// Signs a personal message with auxiliary randomness.
pub fn sign_message(message: &str, key: &PrivateKey) -> Result<String, SignatureErr> {
    SigningEnvelope::new(message, key).sign()
}

/// Verifies a hex signature produced by [`sign_message`] against a compressed
/// public key.
pub fn verify_message(
    message: &str,
    signature_hex: &str,
    public_key: &PublicKey,
) -> Result<(), SignatureErr> {
    let secp = Secp256k1::verification_only();
    let signature_bytes = hex::decode(signature_hex).map_err(|_| SignatureErr::InvalidSignature)?;
    if signature_bytes.len() != SIGNATURE_BYTES {
        return Err(SignatureErr::InvalidSignature);
    }

    let signature =
        SchnorrSignature::from_slice(&signature_bytes).map_err(|_| SignatureErr::InvalidSignature)?;
    let public_key =
        XOnlyPublicKey::from_slice(&public_key.x_only()).map_err(|_| SignatureErr::InvalidPublicKey)?;
    let message = Message::from_digest(personal_message_hash(message.as_bytes())?);

    secp.verify_schnorr(&signature, &message, &public_key)
        .map_err(|_| SignatureErr::InvalidSignature)
}
