// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! The field table shared by the payload encoder and the record decoder.
//!
//! Every action name maps to an ordered list of field specs. The signing
//! string, the wire payload and the decoder all walk this table, so the field
//! order for an action exists in exactly one place.

use crate::codec::is_base64_alphabet;
use crate::primitives::is_valid_public_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed protocol tag.
pub const PROTOCOL_TAG: &str = "k";

/// Protocol version carried after the tag.
pub const PROTOCOL_VERSION: &str = "1";

/// Number of header parts before the action fields:
/// tag, version, action name, sender pubkey, signature.
pub const HEADER_PARTS: usize = 5;

pub const VOTE_KINDS: &[&str] = &["upvote", "downvote"];
pub const BLOCKING_ACTIONS: &[&str] = &["block", "unblock"];
pub const FOLLOWING_ACTIONS: &[&str] = &["follow", "unfollow"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, Base64 encoded UTF-8.
    Text,

    /// Already Base64 encoded binary blob. May be empty.
    Image,

    /// Id of a referenced record.
    RecordId,

    /// Single compressed public key.
    PublicKey,

    /// JSON array of compressed public keys. Order is significant.
    PublicKeyList,

    /// One of a closed set of literals.
    Choice(&'static [&'static str]),
}

impl FieldKind {
    /// Checks a wire value against this kind. Used on both the encoding and
    /// decoding side.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        if value.contains(':') {
            return false;
        }

        match self {
            Self::Text => is_base64_alphabet(value),
            Self::Image => is_base64_alphabet(value),
            Self::RecordId => !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric()),
            Self::PublicKey => is_valid_public_key(value),
            // Only the compact form the encoder writes
            Self::PublicKeyList => match serde_json::from_str::<Vec<String>>(value) {
                Ok(keys) => {
                    keys.iter().all(|k| is_valid_public_key(k))
                        && serde_json::to_string(&keys).map_or(false, |compact| compact == value)
                }
                Err(_) => false,
            },
            Self::Choice(options) => options.contains(&value),
        }
    }

    /// Structural fields decide whether a payload is a protocol record at all.
    /// Free text is only checked when it is rendered.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Text | Self::Image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_MENTIONED_PUBKEYS: &str = "mentioned_pubkeys";
pub const FIELD_MENTIONED_PUBKEY: &str = "mentioned_pubkey";
pub const FIELD_POST_ID: &str = "post_id";
pub const FIELD_NICKNAME: &str = "nickname";
pub const FIELD_PROFILE_IMAGE: &str = "profile_image";
pub const FIELD_VOTE: &str = "vote";
pub const FIELD_BLOCKING_ACTION: &str = "blocking_action";
pub const FIELD_BLOCKED_USER_PUBKEY: &str = "blocked_user_pubkey";
pub const FIELD_FOLLOWING_ACTION: &str = "following_action";
pub const FIELD_FOLLOWED_USER_PUBKEY: &str = "followed_user_pubkey";

const POST_FIELDS: &[FieldSpec] = &[
    field(FIELD_MESSAGE, FieldKind::Text),
    field(FIELD_MENTIONED_PUBKEYS, FieldKind::PublicKeyList),
];

const REPLY_FIELDS: &[FieldSpec] = &[
    field(FIELD_POST_ID, FieldKind::RecordId),
    field(FIELD_MESSAGE, FieldKind::Text),
    field(FIELD_MENTIONED_PUBKEYS, FieldKind::PublicKeyList),
];

const BROADCAST_FIELDS: &[FieldSpec] = &[
    field(FIELD_NICKNAME, FieldKind::Text),
    field(FIELD_PROFILE_IMAGE, FieldKind::Image),
    field(FIELD_MESSAGE, FieldKind::Text),
];

const VOTE_FIELDS: &[FieldSpec] = &[
    field(FIELD_POST_ID, FieldKind::RecordId),
    field(FIELD_VOTE, FieldKind::Choice(VOTE_KINDS)),
    field(FIELD_MENTIONED_PUBKEY, FieldKind::PublicKey),
];

const BLOCK_FIELDS: &[FieldSpec] = &[
    field(FIELD_BLOCKING_ACTION, FieldKind::Choice(BLOCKING_ACTIONS)),
    field(FIELD_BLOCKED_USER_PUBKEY, FieldKind::PublicKey),
];

const FOLLOW_FIELDS: &[FieldSpec] = &[
    field(FIELD_FOLLOWING_ACTION, FieldKind::Choice(FOLLOWING_ACTIONS)),
    field(FIELD_FOLLOWED_USER_PUBKEY, FieldKind::PublicKey),
];

const QUOTE_FIELDS: &[FieldSpec] = &[
    field(FIELD_POST_ID, FieldKind::RecordId),
    field(FIELD_MESSAGE, FieldKind::Text),
    field(FIELD_MENTIONED_PUBKEY, FieldKind::PublicKey),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Post,
    Reply,
    Broadcast,
    Vote,
    Block,
    Follow,
    Quote,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        Self::Post,
        Self::Reply,
        Self::Broadcast,
        Self::Vote,
        Self::Block,
        Self::Follow,
        Self::Quote,
    ];

    /// Name used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Reply => "reply",
            Self::Broadcast => "broadcast",
            Self::Vote => "vote",
            Self::Block => "block",
            Self::Follow => "follow",
            Self::Quote => "quote",
        }
    }

    /// Ordered fields carried after the signature.
    #[must_use]
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Post => POST_FIELDS,
            Self::Reply => REPLY_FIELDS,
            Self::Broadcast => BROADCAST_FIELDS,
            Self::Vote => VOTE_FIELDS,
            Self::Block => BLOCK_FIELDS,
            Self::Follow => FOLLOW_FIELDS,
            Self::Quote => QUOTE_FIELDS,
        }
    }

    /// Total number of colon separated parts of a wire payload for this action.
    #[must_use]
    pub fn wire_arity(&self) -> usize {
        HEADER_PARTS + self.fields().len()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or("unknown action")
    }
}
