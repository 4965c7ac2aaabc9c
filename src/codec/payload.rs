// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::*;
use crate::primitives::{PrivateKey, PublicKey, SignatureErr, SigningEnvelope, SIGNATURE_BYTES};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErr {
    Validation(ValidationErr),
    Signature(SignatureErr),
}

impl fmt::Display for EncodeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Signature(err) => write!(f, "signing failed: {err}"),
        }
    }
}

impl std::error::Error for EncodeErr {}

impl From<ValidationErr> for EncodeErr {
    fn from(err: ValidationErr) -> Self {
        Self::Validation(err)
    }
}

impl From<SignatureErr> for EncodeErr {
    fn from(err: SignatureErr) -> Self {
        Self::Signature(err)
    }
}

/// `k:1:<action>:<sender pubkey>:<signature>:<fields...>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WirePayload(String);

impl WirePayload {
    /// Pure and deterministic: the same action and signature always produce
    /// the same bytes.
    pub fn serialize(
        action: &Action,
        sender: &PublicKey,
        signature_hex: &str,
    ) -> Result<Self, ValidationErr> {
        if !is_signature_hex(signature_hex) {
            return Err(ValidationErr::InvalidField("signature"));
        }

        let fields = action.wire_fields()?;
        Ok(Self(format!(
            "{}:{}:{}:{}:{}:{}",
            PROTOCOL_TAG,
            PROTOCOL_VERSION,
            action.kind(),
            sender.to_hex(),
            signature_hex,
            fields.join(":")
        )))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes as embedded in the transaction.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WirePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn is_signature_hex(candidate: &str) -> bool {
    candidate.len() == SIGNATURE_BYTES * 2 && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAction {
    pub signing_string: String,
    pub signature: String,
    pub payload: WirePayload,
}

/// Validates, signs and serializes an action.
pub fn encode_action(action: &Action, key: &PrivateKey) -> Result<SignedAction, EncodeErr> {
    let signing_string = action.signing_string()?;
    let sender = key.public_key()?;
    let signature = SigningEnvelope::new(&signing_string, key).sign()?;
    let payload = WirePayload::serialize(action, &sender, &signature)?;

    Ok(SignedAction {
        signing_string,
        signature,
        payload,
    })
}
