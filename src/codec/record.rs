// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::payload::is_signature_hex;
use crate::codec::*;
use crate::primitives::{is_valid_public_key, verify_message, PublicKey, SignatureErr};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw transaction payload as handed over by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Transaction id.
    pub id: String,

    /// Payload text.
    pub payload: String,

    /// Block time in milliseconds.
    pub timestamp: i64,
}

/// A wire payload that matched the protocol, split into its named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecord {
    pub id: String,
    pub action: ActionKind,
    pub sender_pubkey: String,
    pub signature: String,

    /// Milliseconds since the epoch, from the ledger.
    pub timestamp: i64,

    /// Raw wire values keyed by field name.
    pub fields: BTreeMap<String, String>,
}

impl DecodedRecord {
    /// Classifies a payload. Anything that is not a well formed protocol
    /// record yields `None`; arbitrary data legitimately shares the ledger so
    /// this is not an error.
    pub fn classify(payload: &str, id: impl Into<String>, timestamp: i64) -> Option<Self> {
        let parts: Vec<&str> = payload.split(':').collect();
        if parts.len() < HEADER_PARTS || parts[0] != PROTOCOL_TAG || parts[1] != PROTOCOL_VERSION {
            return None;
        }

        let Ok(action) = parts[2].parse::<ActionKind>() else {
            trace!("Dropping record with unknown action {:?}", parts[2]);
            return None;
        };

        if parts.len() != action.wire_arity() {
            trace!(
                "Dropping {} record with {} parts, expected {}",
                action,
                parts.len(),
                action.wire_arity()
            );
            return None;
        }

        if !is_valid_public_key(parts[3]) || !is_signature_hex(parts[4]) {
            trace!("Dropping {} record with malformed header", action);
            return None;
        }

        let mut fields = BTreeMap::new();
        for (spec, value) in action.fields().iter().zip(&parts[HEADER_PARTS..]) {
            if spec.kind.is_structural() && !spec.kind.accepts(value) {
                trace!("Dropping {} record with malformed {}", action, spec.name);
                return None;
            }
            fields.insert(spec.name.to_owned(), (*value).to_owned());
        }

        Some(Self {
            id: id.into(),
            action,
            sender_pubkey: parts[3].to_owned(),
            signature: parts[4].to_owned(),
            timestamp,
            fields,
        })
    }

    /// Same as [`DecodedRecord::classify`] for raw transaction payload bytes.
    pub fn classify_bytes(payload: &[u8], id: impl Into<String>, timestamp: i64) -> Option<Self> {
        let payload = std::str::from_utf8(payload).ok()?;
        Self::classify(payload, id, timestamp)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Decoded free-text field, or the placeholder when it cannot be decoded.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).map(decode_text_or_placeholder)
    }

    /// Id of the post or the pubkey of the user this record points at.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self.action {
            ActionKind::Reply | ActionKind::Vote | ActionKind::Quote => self.field(FIELD_POST_ID),
            ActionKind::Block => self.field(FIELD_BLOCKED_USER_PUBKEY),
            ActionKind::Follow => self.field(FIELD_FOLLOWED_USER_PUBKEY),
            ActionKind::Post | ActionKind::Broadcast => None,
        }
    }

    /// Mentioned pubkeys carried by this record, in wire order.
    #[must_use]
    pub fn mentioned_pubkeys(&self) -> Vec<String> {
        if let Some(list) = self.field(FIELD_MENTIONED_PUBKEYS) {
            return serde_json::from_str(list).unwrap_or_default();
        }

        self.field(FIELD_MENTIONED_PUBKEY)
            .map(|pk| vec![pk.to_owned()])
            .unwrap_or_default()
    }

    /// Rebuilds the typed action. Free text is decoded strictly.
    pub fn to_action(&self) -> Result<Action, DecodeErr> {
        Action::from_wire_fields(self.action, &self.fields)
    }

    /// The string the sender signed, rebuilt from the wire fields.
    #[must_use]
    pub fn signing_string(&self) -> String {
        self.action
            .fields()
            .iter()
            .map(|spec| self.field(spec.name).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Checks the signature against the sender key.
    pub fn verify(&self) -> Result<(), SignatureErr> {
        let sender =
            PublicKey::from_hex(&self.sender_pubkey).map_err(|_| SignatureErr::InvalidPublicKey)?;
        verify_message(&self.signing_string(), &self.signature, &sender)
    }
}

impl LedgerRecord {
    #[must_use]
    pub fn classify(&self) -> Option<DecodedRecord> {
        DecodedRecord::classify(&self.payload, self.id.clone(), self.timestamp)
    }
}

/// Keeps only the records that match the protocol, preserving order.
pub fn classify_records<'a>(records: impl IntoIterator<Item = &'a LedgerRecord>) -> Vec<DecodedRecord> {
    records.into_iter().filter_map(LedgerRecord::classify).collect()
}

/// Mentioned pubkeys of a raw post or reply payload. Empty for anything
/// else.
#[must_use]
pub fn parse_mentioned_pubkeys(payload: &str) -> Vec<String> {
    match DecodedRecord::classify(payload, "", 0) {
        Some(record) if matches!(record.action, ActionKind::Post | ActionKind::Reply) => {
            record.mentioned_pubkeys()
        }
        _ => vec![],
    }
}
