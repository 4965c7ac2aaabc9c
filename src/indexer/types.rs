// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! JSON shapes served by the indexer. Text fields stay Base64 encoded here and
//! are decoded by the reconstruction layer.

use crate::codec::VoteKind;
use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page the indexer serves.
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub has_more: bool,

    /// Cursor for older items.
    #[serde(default)]
    pub next_cursor: Option<String>,

    /// Cursor for newer items.
    #[serde(default)]
    pub prev_cursor: Option<String>,
}

/// Cursors are opaque and passed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationOptions {
    pub limit: Option<u32>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl PaginationOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    /// `limit` is always sent, empty cursors never are.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.effective_limit().to_string())];
        if let Some(before) = self.before.as_ref().filter(|c| !c.is_empty()) {
            pairs.push(("before", before.clone()));
        }
        if let Some(after) = self.after.as_ref().filter(|c| !c.is_empty()) {
            pairs.push(("after", after.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerQuoteData {
    pub referenced_content_id: String,

    /// Base64
    pub referenced_message: String,
    pub referenced_sender_pubkey: String,

    /// Base64
    #[serde(default)]
    pub referenced_nickname: Option<String>,
    #[serde(default)]
    pub referenced_profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPost {
    pub id: String,
    pub user_public_key: String,

    /// Base64
    pub post_content: String,
    pub signature: String,

    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    pub replies_count: u64,
    pub up_votes_count: u64,
    #[serde(default)]
    pub down_votes_count: u64,
    pub quotes_count: u64,
    pub reposts_count: u64,
    #[serde(default)]
    pub parent_post_id: Option<String>,
    #[serde(default)]
    pub mentioned_pubkeys: Option<Vec<String>>,
    #[serde(default)]
    pub is_upvoted: Option<bool>,
    #[serde(default)]
    pub is_downvoted: Option<bool>,

    /// Base64
    #[serde(default)]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub user_profile_image: Option<String>,
    #[serde(default)]
    pub is_quote: Option<bool>,
    #[serde(default)]
    pub quote: Option<ServerQuoteData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerReply {
    pub id: String,
    pub user_public_key: String,
    pub post_content: String,
    pub signature: String,
    pub timestamp: i64,
    pub replies_count: u64,
    pub up_votes_count: u64,
    #[serde(default)]
    pub down_votes_count: u64,
    pub quotes_count: u64,
    pub reposts_count: u64,
    #[serde(default)]
    pub parent_post_id: Option<String>,
    #[serde(default)]
    pub mentioned_pubkeys: Option<Vec<String>>,
    #[serde(default)]
    pub is_upvoted: Option<bool>,
    #[serde(default)]
    pub is_downvoted: Option<bool>,
    #[serde(default)]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub user_profile_image: Option<String>,
}

/// Latest introduction of a user, as served by `get-users`. Carries no
/// counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUserPost {
    pub id: String,
    pub user_public_key: String,
    pub post_content: String,
    pub signature: String,
    pub timestamp: i64,
    #[serde(default)]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub user_profile_image: Option<String>,
}

/// Latest introduction of a user plus relation counters, relative to the
/// requester.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUserDetails {
    pub user_public_key: String,
    #[serde(default)]
    pub post_content: Option<String>,
    #[serde(default)]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub user_profile_image: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub blocked_count: u64,
    #[serde(default)]
    pub followed_user: Option<bool>,
    #[serde(default)]
    pub blocked_user: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationContentType {
    Post,
    Reply,
    Vote,
    Quote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub id: String,
    pub user_public_key: String,
    pub post_content: String,
    pub timestamp: i64,
    #[serde(default)]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub user_profile_image: Option<String>,
    pub content_type: NotificationContentType,
    pub cursor: String,
    #[serde(default)]
    pub vote_type: Option<VoteKind>,
    #[serde(default)]
    pub mention_block_time: Option<i64>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,

    /// Base64 content of the post that was voted on.
    #[serde(default)]
    pub voted_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<ServerPost>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
    pub posts: Vec<ServerUserPost>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliesPage {
    pub replies: Vec<ServerReply>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsPage {
    pub notifications: Vec<NotificationData>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetails {
    pub post: ServerPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCount {
    pub count: u64,
}

/// Answer of the indexer health endpoint. Only `network` is relied on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub network: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PK: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn pagination_defaults() {
        assert_eq!(
            PaginationOptions::new().query_pairs(),
            vec![("limit", "10".to_owned())]
        );
    }

    #[test]
    fn pagination_limit_is_clamped() {
        assert_eq!(PaginationOptions::new().limit(500).effective_limit(), 100);
        assert_eq!(PaginationOptions::new().limit(0).effective_limit(), 1);
        assert_eq!(PaginationOptions::new().limit(25).effective_limit(), 25);
    }

    #[test]
    fn pagination_skips_empty_cursors() {
        let options = PaginationOptions::new().before("").after("1700000000000");
        assert_eq!(
            options.query_pairs(),
            vec![
                ("limit", "10".to_owned()),
                ("after", "1700000000000".to_owned())
            ]
        );
    }

    #[test]
    fn it_deserializes_a_posts_page() {
        let json = format!(
            r#"{{
                "posts": [{{
                    "id": "abc",
                    "userPublicKey": "{PK}",
                    "postContent": "SGVsbG8=",
                    "signature": "ff",
                    "timestamp": 1700000000000,
                    "repliesCount": 2,
                    "upVotesCount": 3,
                    "quotesCount": 0,
                    "repostsCount": 0,
                    "isUpvoted": true,
                    "mentionedPubkeys": ["{PK}"],
                    "isQuote": true,
                    "quote": {{
                        "referencedContentId": "def",
                        "referencedMessage": "SGk=",
                        "referencedSenderPubkey": "{PK}"
                    }}
                }}],
                "pagination": {{ "hasMore": true, "nextCursor": "1699", "prevCursor": null }}
            }}"#
        );

        let page: PostsPage = serde_json::from_str(&json).unwrap();
        let post = &page.posts[0];
        assert_eq!(post.down_votes_count, 0);
        assert_eq!(post.is_upvoted, Some(true));
        assert_eq!(post.is_downvoted, None);
        assert_eq!(post.mentioned_pubkeys.as_deref(), Some(&[PK.to_owned()][..]));
        assert_eq!(post.quote.as_ref().unwrap().referenced_content_id, "def");
        assert!(page.pagination.has_more);
        assert_eq!(page.pagination.next_cursor.as_deref(), Some("1699"));
        assert_eq!(page.pagination.prev_cursor, None);
    }

    #[test]
    fn it_deserializes_notifications() {
        let json = format!(
            r#"{{
                "notifications": [{{
                    "id": "n1",
                    "userPublicKey": "{PK}",
                    "postContent": "",
                    "timestamp": 1700000000000,
                    "contentType": "vote",
                    "cursor": "c1",
                    "voteType": "downvote",
                    "mentionBlockTime": null,
                    "postId": "p1",
                    "votedContent": "SGk="
                }}],
                "pagination": {{ "hasMore": false }}
            }}"#
        );

        let page: NotificationsPage = serde_json::from_str(&json).unwrap();
        let notification = &page.notifications[0];
        assert_eq!(notification.content_type, NotificationContentType::Vote);
        assert_eq!(notification.vote_type, Some(VoteKind::Downvote));
        assert_eq!(notification.mention_block_time, None);
        assert_eq!(notification.content_id, None);
        assert_eq!(page.pagination, PaginationMetadata::default());
    }

    #[test]
    fn user_details_counters_default_to_zero() {
        let json = format!(r#"{{"userPublicKey":"{PK}","followedUser":true}}"#);
        let details: ServerUserDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(details.followers_count, 0);
        assert_eq!(details.followed_user, Some(true));
        assert_eq!(details.blocked_user, None);
        assert_eq!(details.post_content, None);
    }

    #[test]
    fn it_rejects_unknown_content_types() {
        let json = format!(
            r#"{{"id":"n","userPublicKey":"{PK}","postContent":"","timestamp":0,"contentType":"repost","cursor":"c"}}"#
        );
        assert!(serde_json::from_str::<NotificationData>(&json).is_err());
    }
}
