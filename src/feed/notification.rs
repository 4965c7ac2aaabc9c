// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{decode_optional_text, decode_text_or_placeholder, VoteKind};
use crate::feed::{format_relative_time, now_millis, AuthorInfo, ViewContext};
use crate::indexer::{IndexerClient, IndexerErr, NotificationContentType, NotificationData};
use log::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const NOTIFICATION_CURSOR_FILE: &str = "notifications_cursor.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationContentType,
    pub author: AuthorInfo,

    /// Decoded content of the mentioning post, empty for votes.
    pub content: String,
    pub timestamp: String,
    pub timestamp_ms: i64,
    pub cursor: String,
    pub vote: Option<VoteKind>,

    /// Post the notification refers to.
    pub post_id: Option<String>,
    pub content_id: Option<String>,

    /// Decoded content of the voted post.
    pub voted_content: Option<String>,
    pub mention_block_time: Option<i64>,
}

impl Notification {
    #[must_use]
    pub fn from_data(data: &NotificationData, ctx: &ViewContext) -> Self {
        let content = if data.post_content.is_empty() {
            String::new()
        } else {
            decode_text_or_placeholder(&data.post_content)
        };

        Self {
            id: data.id.clone(),
            kind: data.content_type,
            author: AuthorInfo::new(
                &data.user_public_key,
                ctx,
                decode_optional_text(data.user_nickname.as_deref()),
                data.user_profile_image.clone(),
            ),
            content,
            timestamp: format_relative_time(ctx.now_ms, data.timestamp),
            timestamp_ms: data.timestamp,
            cursor: data.cursor.clone(),
            vote: data.vote_type,
            post_id: data.post_id.clone(),
            content_id: data.content_id.clone(),
            voted_content: decode_optional_text(data.voted_content.as_deref()),
            mention_block_time: data.mention_block_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedCursor {
    cursor: String,

    /// When the cursor was written, milliseconds.
    timestamp: i64,
}

/// Tracks the newest notification the user has seen and how many arrived
/// since. The cursor survives restarts, the count does not.
#[derive(Debug)]
pub struct NotificationTracker {
    path: PathBuf,
    latest_cursor: Option<String>,
    count: u64,
}

impl NotificationTracker {
    /// Loads the persisted cursor. A corrupt file is removed and treated as
    /// no cursor.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let latest_cursor = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<PersistedCursor>(&raw) {
                Ok(persisted) if !persisted.cursor.is_empty() => Some(persisted.cursor),
                Ok(_) => None,
                Err(err) => {
                    warn!("Discarding invalid notification cursor file: {err}");
                    if let Err(err) = fs::remove_file(&path) {
                        warn!("Failed to remove notification cursor file: {err}");
                    }
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path,
            latest_cursor,
            count: 0,
        }
    }

    #[must_use]
    pub fn latest_cursor(&self) -> Option<&str> {
        self.latest_cursor.as_deref()
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Stores `cursor` as the newest seen notification. `None` clears it.
    pub fn update_latest_cursor(&mut self, cursor: Option<String>) -> io::Result<()> {
        let cursor = cursor.filter(|c| !c.is_empty());
        match &cursor {
            Some(cursor) => {
                let persisted = PersistedCursor {
                    cursor: cursor.clone(),
                    timestamp: now_millis(),
                };
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, serde_json::to_string(&persisted)?)?;
            }
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err),
                _ => {}
            },
        }

        self.latest_cursor = cursor;
        Ok(())
    }

    /// Marks everything up to `cursor` as seen and resets the count.
    pub fn mark_all_seen(&mut self, cursor: &str) -> io::Result<()> {
        self.update_latest_cursor(Some(cursor.to_owned()))?;
        self.count = 0;
        Ok(())
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.count = 0;
        self.update_latest_cursor(None)
    }

    /// Fetches the unread count. On failure the last known count is kept.
    pub async fn refresh(
        &mut self,
        client: &IndexerClient,
        requester: &str,
    ) -> Result<u64, IndexerErr> {
        match client
            .fetch_notifications_count(requester, self.latest_cursor.as_deref())
            .await
        {
            Ok(count) => {
                self.count = count;
                Ok(count)
            }
            Err(err) => {
                warn!("Could not refresh notification count: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_text;
    use crate::primitives::Network;
    use std::time::Duration;

    const PK: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const NOW: i64 = 1_700_000_000_000;

    fn data(kind: NotificationContentType) -> NotificationData {
        NotificationData {
            id: "n1".to_owned(),
            user_public_key: PK.to_owned(),
            post_content: String::new(),
            timestamp: NOW - 60_000,
            user_nickname: Some(encode_text("Alice")),
            user_profile_image: None,
            content_type: kind,
            cursor: "c1".to_owned(),
            vote_type: None,
            mention_block_time: None,
            content_id: None,
            post_id: None,
            voted_content: None,
        }
    }

    #[test]
    fn it_converts_votes() {
        let mut vote = data(NotificationContentType::Vote);
        vote.vote_type = Some(VoteKind::Upvote);
        vote.post_id = Some("p1".to_owned());
        vote.voted_content = Some(encode_text("my post"));

        let ctx = ViewContext::new(None, Network::Mainnet).at(NOW);
        let notification = Notification::from_data(&vote, &ctx);
        assert_eq!(notification.kind, NotificationContentType::Vote);
        assert_eq!(notification.vote, Some(VoteKind::Upvote));
        assert_eq!(notification.voted_content.as_deref(), Some("my post"));
        assert_eq!(notification.content, "");
        assert_eq!(notification.author.name, "Alice");
        assert_eq!(notification.timestamp, "1m");
    }

    #[test]
    fn it_converts_mentions() {
        let mut mention = data(NotificationContentType::Reply);
        mention.post_content = encode_text("hey @you");
        let ctx = ViewContext::new(None, Network::Mainnet).at(NOW);
        let notification = Notification::from_data(&mention, &ctx);
        assert_eq!(notification.content, "hey @you");
        assert_eq!(notification.voted_content, None);
    }

    #[test]
    fn cursor_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join(NOTIFICATION_CURSOR_FILE);

        let mut tracker = NotificationTracker::load(&path);
        assert_eq!(tracker.latest_cursor(), None);
        tracker.mark_all_seen("c42").unwrap();
        assert_eq!(tracker.count(), 0);

        let tracker = NotificationTracker::load(&path);
        assert_eq!(tracker.latest_cursor(), Some("c42"));
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn clearing_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NOTIFICATION_CURSOR_FILE);

        let mut tracker = NotificationTracker::load(&path);
        tracker.update_latest_cursor(Some("c1".to_owned())).unwrap();
        assert!(path.exists());
        tracker.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(tracker.latest_cursor(), None);
        tracker.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NOTIFICATION_CURSOR_FILE);
        fs::write(&path, "{not json").unwrap();

        let tracker = NotificationTracker::load(&path);
        assert_eq!(tracker.latest_cursor(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = NotificationTracker::load(dir.path().join(NOTIFICATION_CURSOR_FILE));
        tracker.count = 7;

        let client = IndexerClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(tracker.refresh(&client, PK).await.is_err());
        assert_eq!(tracker.count(), 7);
    }
}
