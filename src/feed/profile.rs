// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{
    decode_optional_text, ActionKind, DecodedRecord, FIELD_MESSAGE, FIELD_NICKNAME,
    FIELD_PROFILE_IMAGE,
};
use crate::feed::{display_name, latest_record, Avatar, RelationGraph};
use crate::indexer::ServerUserDetails;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub pubkey: String,
    pub nickname: Option<String>,

    /// Base64 PNG.
    pub profile_image: Option<String>,
    pub bio: Option<String>,

    /// Time of the introduction this profile was built from.
    pub updated_at: Option<i64>,

    /// Id of that introduction, breaks ties on `updated_at`.
    #[serde(default)]
    pub updated_id: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub blocked_count: u64,

    /// Viewer blocks this user.
    pub blocked_user: bool,

    /// Viewer follows this user.
    pub followed_user: bool,
}

impl UserProfile {
    #[must_use]
    pub fn empty(pubkey: &str) -> Self {
        Self {
            pubkey: pubkey.to_owned(),
            ..Self::default()
        }
    }

    /// Builds the profile from the latest `broadcast` sent by `pubkey`.
    /// Broadcasts from other senders are ignored.
    #[must_use]
    pub fn from_broadcasts<'a>(
        pubkey: &str,
        records: impl IntoIterator<Item = &'a DecodedRecord>,
    ) -> Self {
        let latest = latest_record(
            records
                .into_iter()
                .filter(|r| r.action == ActionKind::Broadcast && r.sender_pubkey == pubkey),
        );

        let mut profile = Self::empty(pubkey);
        if let Some(record) = latest {
            profile.apply_broadcast(record);
        }
        profile
    }

    /// Replaces the introduction fields when `record` is a newer broadcast
    /// from the same user.
    pub fn apply_broadcast(&mut self, record: &DecodedRecord) -> bool {
        if record.action != ActionKind::Broadcast || record.sender_pubkey != self.pubkey {
            return false;
        }
        if let Some(at) = self.updated_at {
            let current = (at, self.updated_id.as_deref().unwrap_or_default());
            if current >= (record.timestamp, record.id.as_str()) {
                return false;
            }
        }

        self.nickname = decode_optional_text(record.field(FIELD_NICKNAME));
        self.profile_image = record
            .field(FIELD_PROFILE_IMAGE)
            .filter(|img| !img.is_empty())
            .map(str::to_owned);
        self.bio = decode_optional_text(record.field(FIELD_MESSAGE));
        self.updated_at = Some(record.timestamp);
        self.updated_id = Some(record.id.clone());
        true
    }

    #[must_use]
    pub fn from_server_details(details: &ServerUserDetails) -> Self {
        Self {
            pubkey: details.user_public_key.clone(),
            nickname: decode_optional_text(details.user_nickname.as_deref()),
            profile_image: details
                .user_profile_image
                .clone()
                .filter(|img| !img.is_empty()),
            bio: decode_optional_text(details.post_content.as_deref()),
            updated_at: details.timestamp,
            updated_id: None,
            followers_count: details.followers_count,
            following_count: details.following_count,
            blocked_count: details.blocked_count,
            blocked_user: details.blocked_user.unwrap_or(false),
            followed_user: details.followed_user.unwrap_or(false),
        }
    }

    /// Fills counters and viewer flags from locally resolved relations.
    pub fn apply_relations(&mut self, graph: &RelationGraph, viewer: Option<&str>) {
        self.followers_count = graph.followers_of(&self.pubkey).len() as u64;
        self.following_count = graph.following_of(&self.pubkey).len() as u64;
        self.blocked_count = graph.blocked_by(&self.pubkey).len() as u64;

        if let Some(viewer) = viewer {
            self.followed_user = graph.is_following(viewer, &self.pubkey);
            self.blocked_user = graph.is_blocking(viewer, &self.pubkey);
        }
    }

    #[must_use]
    pub fn has_introduction(&self) -> bool {
        self.nickname.is_some() || self.bio.is_some() || self.profile_image.is_some()
    }

    #[must_use]
    pub fn display_name(&self, viewer: Option<&str>) -> String {
        display_name(&self.pubkey, viewer, self.nickname.as_deref())
    }

    #[must_use]
    pub fn avatar(&self) -> Avatar {
        Avatar::new(&self.pubkey, self.profile_image.as_deref())
    }
}
