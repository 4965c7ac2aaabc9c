// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Optimistic state for actions that were submitted but are not yet visible
//! through the indexer.
//!
//! Overrides are kept apart from the fetched entities. Rendering merges them
//! over server truth; every poll reconciles them, dropping the ones the server
//! already reflects and the ones that are too old.

use crate::codec::{Action, BlockingAction, FollowingAction, VoteKind};
use crate::feed::{Post, UserProfile};

/// Overrides older than this are dropped even if never confirmed.
pub const DEFAULT_OVERRIDE_TTL_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Vote { post_id: String, vote: VoteKind },
    Follow { target: String, action: FollowingAction },
    Block { target: String, action: BlockingAction },
}

impl PendingChange {
    /// The relation change an action implies, if it has one.
    #[must_use]
    pub fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::Vote { post_id, vote, .. } => Some(Self::Vote {
                post_id: post_id.clone(),
                vote: *vote,
            }),
            Action::Follow {
                action,
                followed_user_pubkey,
            } => Some(Self::Follow {
                target: followed_user_pubkey.clone(),
                action: *action,
            }),
            Action::Block {
                action,
                blocked_user_pubkey,
            } => Some(Self::Block {
                target: blocked_user_pubkey.clone(),
                action: *action,
            }),
            _ => None,
        }
    }

    fn confirmed_by_post(&self, post: &Post) -> bool {
        match self {
            Self::Vote { post_id, vote } if *post_id == post.id => match vote {
                VoteKind::Upvote => post.up_voted,
                VoteKind::Downvote => post.down_voted,
            },
            _ => false,
        }
    }

    fn confirmed_by_profile(&self, profile: &UserProfile) -> bool {
        match self {
            Self::Follow { target, action } if *target == profile.pubkey => {
                profile.followed_user == (*action == FollowingAction::Follow)
            }
            Self::Block { target, action } if *target == profile.pubkey => {
                profile.blocked_user == (*action == BlockingAction::Block)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingOverride {
    change: PendingChange,
    submitted_at_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PendingOverrides {
    entries: Vec<PendingOverride>,
}

impl PendingOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change. A newer change to the same relation replaces the
    /// older one.
    pub fn push(&mut self, change: PendingChange, submitted_at_ms: i64) {
        self.entries.retain(|entry| !same_relation(&entry.change, &change));
        self.entries.push(PendingOverride {
            change,
            submitted_at_ms,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Server view of `post` with pending votes applied. `post` itself is
    /// left untouched.
    #[must_use]
    pub fn apply_to_post(&self, post: &Post) -> Post {
        let mut merged = post.clone();
        for entry in &self.entries {
            if let PendingChange::Vote { post_id, vote } = &entry.change {
                if *post_id != merged.id || entry.change.confirmed_by_post(&merged) {
                    continue;
                }

                match vote {
                    VoteKind::Upvote => {
                        merged.up_voted = true;
                        merged.up_votes += 1;
                        if merged.down_voted {
                            merged.down_voted = false;
                            merged.down_votes = merged.down_votes.saturating_sub(1);
                        }
                    }
                    VoteKind::Downvote => {
                        merged.down_voted = true;
                        merged.down_votes += 1;
                        if merged.up_voted {
                            merged.up_voted = false;
                            merged.up_votes = merged.up_votes.saturating_sub(1);
                        }
                    }
                }
            }
        }
        merged
    }

    #[must_use]
    pub fn apply_to_profile(&self, profile: &UserProfile) -> UserProfile {
        let mut merged = profile.clone();
        for entry in &self.entries {
            if entry.change.confirmed_by_profile(&merged) {
                continue;
            }

            match &entry.change {
                PendingChange::Follow { target, action } if *target == merged.pubkey => {
                    let follow = *action == FollowingAction::Follow;
                    merged.followed_user = follow;
                    merged.followers_count = if follow {
                        merged.followers_count + 1
                    } else {
                        merged.followers_count.saturating_sub(1)
                    };
                }
                PendingChange::Block { target, action } if *target == merged.pubkey => {
                    merged.blocked_user = *action == BlockingAction::Block;
                }
                _ => {}
            }
        }
        merged
    }

    /// Drops overrides the freshly polled posts already reflect, plus
    /// expired ones.
    pub fn reconcile_posts(&mut self, posts: &[Post], now_ms: i64, ttl_ms: i64) {
        self.entries.retain(|entry| {
            now_ms - entry.submitted_at_ms < ttl_ms
                && !posts.iter().any(|p| entry.change.confirmed_by_post(p))
        });
    }

    pub fn reconcile_profiles(&mut self, profiles: &[UserProfile], now_ms: i64, ttl_ms: i64) {
        self.entries.retain(|entry| {
            now_ms - entry.submitted_at_ms < ttl_ms
                && !profiles.iter().any(|p| entry.change.confirmed_by_profile(p))
        });
    }
}

fn same_relation(a: &PendingChange, b: &PendingChange) -> bool {
    match (a, b) {
        (PendingChange::Vote { post_id: x, .. }, PendingChange::Vote { post_id: y, .. }) => x == y,
        (PendingChange::Follow { target: x, .. }, PendingChange::Follow { target: y, .. }) => x == y,
        (PendingChange::Block { target: x, .. }, PendingChange::Block { target: y, .. }) => x == y,
        _ => false,
    }
}
