// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MAX_NICKNAME_CHARS: usize = 20;
pub const MAX_BIO_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErr {
    /// A required field is absent or empty.
    MissingField(&'static str),

    /// A field has a value the wire format cannot carry.
    InvalidField(&'static str),

    /// A public key field does not match the compressed key format.
    InvalidPublicKey(&'static str),

    /// Nickname rejected, with the reason.
    InvalidNickname(&'static str),

    /// The signing key could not be parsed.
    InvalidPrivateKey,
}

impl fmt::Display for ValidationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::InvalidField(field) => write!(f, "invalid value for field: {field}"),
            Self::InvalidPublicKey(field) => write!(f, "invalid public key in field: {field}"),
            Self::InvalidNickname(reason) => write!(f, "invalid nickname: {reason}"),
            Self::InvalidPrivateKey => write!(f, "invalid private key"),
        }
    }
}

impl std::error::Error for ValidationErr {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

impl FromStr for VoteKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(Self::Upvote),
            "downvote" => Ok(Self::Downvote),
            _ => Err("invalid vote kind"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockingAction {
    Block,
    Unblock,
}

impl BlockingAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Unblock => "unblock",
        }
    }
}

impl FromStr for BlockingAction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Self::Block),
            "unblock" => Ok(Self::Unblock),
            _ => Err("invalid blocking action"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowingAction {
    Follow,
    Unfollow,
}

impl FollowingAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
        }
    }
}

impl FromStr for FollowingAction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(Self::Follow),
            "unfollow" => Ok(Self::Unfollow),
            _ => Err("invalid following action"),
        }
    }
}

/// A user initiated operation. Each variant carries exactly what its signing
/// string and wire payload need. Free text is held decoded; Base64 encoding
/// happens when the wire fields are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Post {
        message: String,
        mentioned_pubkeys: Vec<String>,
    },
    Reply {
        post_id: String,
        message: String,
        mentioned_pubkeys: Vec<String>,
    },
    /// Profile introduce/update.
    Broadcast {
        nickname: String,
        /// Base64 PNG, passed through untouched.
        profile_image: Option<String>,
        message: String,
    },
    Vote {
        post_id: String,
        vote: VoteKind,
        mentioned_pubkey: String,
    },
    Block {
        action: BlockingAction,
        blocked_user_pubkey: String,
    },
    Follow {
        action: FollowingAction,
        followed_user_pubkey: String,
    },
    Quote {
        post_id: String,
        message: String,
        mentioned_pubkey: String,
    },
}

impl Action {
    pub fn post(message: impl Into<String>, mentioned_pubkeys: Vec<String>) -> Self {
        Self::Post {
            message: message.into(),
            mentioned_pubkeys,
        }
    }

    pub fn reply(
        post_id: impl Into<String>,
        message: impl Into<String>,
        mentioned_pubkeys: Vec<String>,
    ) -> Self {
        Self::Reply {
            post_id: post_id.into(),
            message: message.into(),
            mentioned_pubkeys,
        }
    }

    /// An empty profile image is normalised to no image.
    pub fn broadcast(
        nickname: impl Into<String>,
        profile_image: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Broadcast {
            nickname: nickname.into(),
            profile_image: profile_image.filter(|img| !img.is_empty()),
            message: message.into(),
        }
    }

    pub fn vote(
        post_id: impl Into<String>,
        vote: VoteKind,
        mentioned_pubkey: impl Into<String>,
    ) -> Self {
        Self::Vote {
            post_id: post_id.into(),
            vote,
            mentioned_pubkey: mentioned_pubkey.into(),
        }
    }

    pub fn block(action: BlockingAction, blocked_user_pubkey: impl Into<String>) -> Self {
        Self::Block {
            action,
            blocked_user_pubkey: blocked_user_pubkey.into(),
        }
    }

    pub fn follow(action: FollowingAction, followed_user_pubkey: impl Into<String>) -> Self {
        Self::Follow {
            action,
            followed_user_pubkey: followed_user_pubkey.into(),
        }
    }

    pub fn quote(
        post_id: impl Into<String>,
        message: impl Into<String>,
        mentioned_pubkey: impl Into<String>,
    ) -> Self {
        Self::Quote {
            post_id: post_id.into(),
            message: message.into(),
            mentioned_pubkey: mentioned_pubkey.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Post { .. } => ActionKind::Post,
            Self::Reply { .. } => ActionKind::Reply,
            Self::Broadcast { .. } => ActionKind::Broadcast,
            Self::Vote { .. } => ActionKind::Vote,
            Self::Block { .. } => ActionKind::Block,
            Self::Follow { .. } => ActionKind::Follow,
            Self::Quote { .. } => ActionKind::Quote,
        }
    }

    /// Checks the action can be encoded. Runs before any signing or network
    /// work.
    pub fn validate(&self) -> Result<(), ValidationErr> {
        self.wire_fields().map(|_| ())
    }

    /// Canonical string that gets signed. Excludes the sender key and the
    /// signature.
    pub fn signing_string(&self) -> Result<String, ValidationErr> {
        Ok(self.wire_fields()?.join(":"))
    }

    /// Encoded field values in table order.
    pub fn wire_fields(&self) -> Result<Vec<String>, ValidationErr> {
        self.check_content()?;

        self.kind()
            .fields()
            .iter()
            .map(|spec| {
                let value = self
                    .wire_field(spec.name)
                    .ok_or(ValidationErr::MissingField(spec.name))?;

                if value.is_empty() && !matches!(spec.kind, FieldKind::Text | FieldKind::Image) {
                    return Err(ValidationErr::MissingField(spec.name));
                }

                if !spec.kind.accepts(&value) {
                    return match spec.kind {
                        FieldKind::PublicKey | FieldKind::PublicKeyList => {
                            Err(ValidationErr::InvalidPublicKey(spec.name))
                        }
                        _ => Err(ValidationErr::InvalidField(spec.name)),
                    };
                }

                Ok(value)
            })
            .collect()
    }

    fn wire_field(&self, name: &str) -> Option<String> {
        match (self, name) {
            (Self::Post { message, .. }, FIELD_MESSAGE)
            | (Self::Reply { message, .. }, FIELD_MESSAGE)
            | (Self::Broadcast { message, .. }, FIELD_MESSAGE)
            | (Self::Quote { message, .. }, FIELD_MESSAGE) => Some(encode_text(message)),
            (
                Self::Post {
                    mentioned_pubkeys, ..
                },
                FIELD_MENTIONED_PUBKEYS,
            )
            | (
                Self::Reply {
                    mentioned_pubkeys, ..
                },
                FIELD_MENTIONED_PUBKEYS,
            ) => Some(serde_json::to_string(mentioned_pubkeys).unwrap_or_default()),
            (Self::Reply { post_id, .. }, FIELD_POST_ID)
            | (Self::Vote { post_id, .. }, FIELD_POST_ID)
            | (Self::Quote { post_id, .. }, FIELD_POST_ID) => Some(post_id.clone()),
            (Self::Broadcast { nickname, .. }, FIELD_NICKNAME) => Some(encode_text(nickname)),
            (Self::Broadcast { profile_image, .. }, FIELD_PROFILE_IMAGE) => {
                Some(profile_image.clone().unwrap_or_default())
            }
            (Self::Vote { vote, .. }, FIELD_VOTE) => Some(vote.as_str().to_owned()),
            (
                Self::Vote {
                    mentioned_pubkey, ..
                },
                FIELD_MENTIONED_PUBKEY,
            )
            | (
                Self::Quote {
                    mentioned_pubkey, ..
                },
                FIELD_MENTIONED_PUBKEY,
            ) => Some(mentioned_pubkey.clone()),
            (Self::Block { action, .. }, FIELD_BLOCKING_ACTION) => Some(action.as_str().to_owned()),
            (
                Self::Block {
                    blocked_user_pubkey,
                    ..
                },
                FIELD_BLOCKED_USER_PUBKEY,
            ) => Some(blocked_user_pubkey.clone()),
            (Self::Follow { action, .. }, FIELD_FOLLOWING_ACTION) => {
                Some(action.as_str().to_owned())
            }
            (
                Self::Follow {
                    followed_user_pubkey,
                    ..
                },
                FIELD_FOLLOWED_USER_PUBKEY,
            ) => Some(followed_user_pubkey.clone()),
            _ => None,
        }
    }

    /// Content rules that the wire table cannot express.
    fn check_content(&self) -> Result<(), ValidationErr> {
        match self {
            Self::Post { message, .. }
            | Self::Reply { message, .. }
            | Self::Quote { message, .. } => {
                if message.trim().is_empty() {
                    return Err(ValidationErr::MissingField(FIELD_MESSAGE));
                }
            }
            Self::Broadcast {
                nickname, message, ..
            } => {
                validate_nickname(nickname)?;
                if message.trim().is_empty() {
                    return Err(ValidationErr::MissingField(FIELD_MESSAGE));
                }
                if message.chars().count() > MAX_BIO_CHARS {
                    return Err(ValidationErr::InvalidField(FIELD_MESSAGE));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Rebuilds a typed action from decoded wire fields. Free text is decoded
    /// strictly.
    pub fn from_wire_fields(
        kind: ActionKind,
        fields: &BTreeMap<String, String>,
    ) -> Result<Self, DecodeErr> {
        let action = match kind {
            ActionKind::Post => Self::Post {
                message: decode_text(field(fields, FIELD_MESSAGE)?)?,
                mentioned_pubkeys: parse_pubkey_list(field(fields, FIELD_MENTIONED_PUBKEYS)?)?,
            },
            ActionKind::Reply => Self::Reply {
                post_id: field(fields, FIELD_POST_ID)?.to_owned(),
                message: decode_text(field(fields, FIELD_MESSAGE)?)?,
                mentioned_pubkeys: parse_pubkey_list(field(fields, FIELD_MENTIONED_PUBKEYS)?)?,
            },
            ActionKind::Broadcast => Self::broadcast(
                decode_text(field(fields, FIELD_NICKNAME)?)?,
                Some(field(fields, FIELD_PROFILE_IMAGE)?.to_owned()),
                decode_text(field(fields, FIELD_MESSAGE)?)?,
            ),
            ActionKind::Vote => Self::Vote {
                post_id: field(fields, FIELD_POST_ID)?.to_owned(),
                vote: field(fields, FIELD_VOTE)?
                    .parse()
                    .map_err(|_| DecodeErr::MalformedField(FIELD_VOTE))?,
                mentioned_pubkey: field(fields, FIELD_MENTIONED_PUBKEY)?.to_owned(),
            },
            ActionKind::Block => Self::Block {
                action: field(fields, FIELD_BLOCKING_ACTION)?
                    .parse()
                    .map_err(|_| DecodeErr::MalformedField(FIELD_BLOCKING_ACTION))?,
                blocked_user_pubkey: field(fields, FIELD_BLOCKED_USER_PUBKEY)?.to_owned(),
            },
            ActionKind::Follow => Self::Follow {
                action: field(fields, FIELD_FOLLOWING_ACTION)?
                    .parse()
                    .map_err(|_| DecodeErr::MalformedField(FIELD_FOLLOWING_ACTION))?,
                followed_user_pubkey: field(fields, FIELD_FOLLOWED_USER_PUBKEY)?.to_owned(),
            },
            ActionKind::Quote => Self::Quote {
                post_id: field(fields, FIELD_POST_ID)?.to_owned(),
                message: decode_text(field(fields, FIELD_MESSAGE)?)?,
                mentioned_pubkey: field(fields, FIELD_MENTIONED_PUBKEY)?.to_owned(),
            },
        };

        Ok(action)
    }
}

fn field<'a>(
    fields: &'a BTreeMap<String, String>,
    name: &'static str,
) -> Result<&'a str, DecodeErr> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or(DecodeErr::MalformedField(name))
}

fn parse_pubkey_list(raw: &str) -> Result<Vec<String>, DecodeErr> {
    serde_json::from_str(raw).map_err(|_| DecodeErr::MalformedField(FIELD_MENTIONED_PUBKEYS))
}

/// Nickname rules for profile broadcasts: required, at most 20 characters and
/// no emoji.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationErr> {
    if nickname.trim().is_empty() {
        return Err(ValidationErr::InvalidNickname("nickname is required"));
    }

    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(ValidationErr::InvalidNickname(
            "nickname must be 20 characters or less",
        ));
    }

    if nickname.chars().any(is_emoji) {
        return Err(ValidationErr::InvalidNickname(
            "nickname cannot contain emojis",
        ));
    }

    Ok(())
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F
            | 0x1F300..=0x1F5FF
            | 0x1F680..=0x1F6FF
            | 0x1F700..=0x1F77F
            | 0x1F780..=0x1F7FF
            | 0x1F800..=0x1F8FF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
    )
}
