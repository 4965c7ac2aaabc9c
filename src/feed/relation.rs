// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Last-write-wins resolution of vote, block and follow relations.
//!
//! The state of an (actor, target) pair is its most recent record. Ties on
//! the timestamp are broken by the record id so the result does not depend
//! on the order records arrive in.

use crate::codec::{
    ActionKind, BlockingAction, DecodedRecord, FollowingAction, VoteKind, FIELD_BLOCKING_ACTION,
    FIELD_FOLLOWING_ACTION, FIELD_VOTE,
};
use std::collections::HashMap;

/// The most recent record by `(timestamp, id)`.
#[must_use]
pub fn latest_record<'a>(
    records: impl IntoIterator<Item = &'a DecodedRecord>,
) -> Option<&'a DecodedRecord> {
    records
        .into_iter()
        .max_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamped<T> {
    timestamp: i64,
    id: String,
    value: T,
}

impl<T> Stamped<T> {
    fn is_newer_than(&self, other: &Self) -> bool {
        (self.timestamp, &self.id) > (other.timestamp, &other.id)
    }
}

type Pair = (String, String);

fn insert_latest<T>(map: &mut HashMap<Pair, Stamped<T>>, key: Pair, entry: Stamped<T>) {
    match map.get(&key) {
        Some(current) if !entry.is_newer_than(current) => {}
        _ => {
            map.insert(key, entry);
        }
    }
}

/// Current relations derived from a set of classified records.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    votes: HashMap<Pair, Stamped<VoteKind>>,
    blocks: HashMap<Pair, Stamped<BlockingAction>>,
    follows: HashMap<Pair, Stamped<FollowingAction>>,
}

impl RelationGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DecodedRecord>) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.apply(record);
        }
        graph
    }

    /// Folds one record in. Records that are not relations, or whose choice
    /// field does not parse, are ignored.
    pub fn apply(&mut self, record: &DecodedRecord) {
        let Some(target) = record.target() else {
            return;
        };
        let key = (record.sender_pubkey.clone(), target.to_owned());

        match record.action {
            ActionKind::Vote => {
                if let Some(value) = record.field(FIELD_VOTE).and_then(|v| v.parse().ok()) {
                    insert_latest(&mut self.votes, key, stamp(record, value));
                }
            }
            ActionKind::Block => {
                if let Some(value) = record
                    .field(FIELD_BLOCKING_ACTION)
                    .and_then(|v| v.parse().ok())
                {
                    insert_latest(&mut self.blocks, key, stamp(record, value));
                }
            }
            ActionKind::Follow => {
                if let Some(value) = record
                    .field(FIELD_FOLLOWING_ACTION)
                    .and_then(|v| v.parse().ok())
                {
                    insert_latest(&mut self.follows, key, stamp(record, value));
                }
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn vote(&self, voter: &str, post_id: &str) -> Option<VoteKind> {
        self.votes
            .get(&(voter.to_owned(), post_id.to_owned()))
            .map(|s| s.value)
    }

    #[must_use]
    pub fn is_blocking(&self, actor: &str, target: &str) -> bool {
        self.blocks
            .get(&(actor.to_owned(), target.to_owned()))
            .map_or(false, |s| s.value == BlockingAction::Block)
    }

    #[must_use]
    pub fn is_following(&self, actor: &str, target: &str) -> bool {
        self.follows
            .get(&(actor.to_owned(), target.to_owned()))
            .map_or(false, |s| s.value == FollowingAction::Follow)
    }

    /// `(upvotes, downvotes)` for a post.
    #[must_use]
    pub fn vote_tally(&self, post_id: &str) -> (u64, u64) {
        self.votes
            .iter()
            .filter(|((_, target), _)| target == post_id)
            .fold((0, 0), |(up, down), (_, s)| match s.value {
                VoteKind::Upvote => (up + 1, down),
                VoteKind::Downvote => (up, down + 1),
            })
    }

    /// Sorted for stable output.
    #[must_use]
    pub fn followers_of(&self, target: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .follows
            .iter()
            .filter(|((_, t), s)| t == target && s.value == FollowingAction::Follow)
            .map(|((actor, _), _)| actor.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn following_of(&self, actor: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .follows
            .iter()
            .filter(|((a, _), s)| a == actor && s.value == FollowingAction::Follow)
            .map(|((_, target), _)| target.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn blocked_by(&self, actor: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .blocks
            .iter()
            .filter(|((a, _), s)| a == actor && s.value == BlockingAction::Block)
            .map(|((_, target), _)| target.as_str())
            .collect();
        out.sort_unstable();
        out
    }
}

fn stamp<T>(record: &DecodedRecord, value: T) -> Stamped<T> {
    Stamped {
        timestamp: record.timestamp,
        id: record.id.clone(),
        value,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::{FIELD_BLOCKED_USER_PUBKEY, FIELD_FOLLOWED_USER_PUBKEY, FIELD_MENTIONED_PUBKEY, FIELD_POST_ID};
    use quickcheck::*;
    use std::collections::BTreeMap;

    pub const PK_A: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    pub const PK_B: &str = "03bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    pub const PK_C: &str = "02cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";

    pub fn record(
        id: &str,
        sender: &str,
        timestamp: i64,
        action: ActionKind,
        fields: &[(&str, &str)],
    ) -> DecodedRecord {
        DecodedRecord {
            id: id.to_owned(),
            action,
            sender_pubkey: sender.to_owned(),
            signature: "ab".repeat(64),
            timestamp,
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn follow(id: &str, actor: &str, target: &str, ts: i64, action: &str) -> DecodedRecord {
        record(
            id,
            actor,
            ts,
            ActionKind::Follow,
            &[
                (FIELD_FOLLOWING_ACTION, action),
                (FIELD_FOLLOWED_USER_PUBKEY, target),
            ],
        )
    }

    fn block(id: &str, actor: &str, target: &str, ts: i64, action: &str) -> DecodedRecord {
        record(
            id,
            actor,
            ts,
            ActionKind::Block,
            &[
                (FIELD_BLOCKING_ACTION, action),
                (FIELD_BLOCKED_USER_PUBKEY, target),
            ],
        )
    }

    fn vote(id: &str, voter: &str, post: &str, ts: i64, kind: &str) -> DecodedRecord {
        record(
            id,
            voter,
            ts,
            ActionKind::Vote,
            &[
                (FIELD_POST_ID, post),
                (FIELD_VOTE, kind),
                (FIELD_MENTIONED_PUBKEY, PK_C),
            ],
        )
    }

    #[test]
    fn later_unfollow_wins() {
        let records = vec![
            follow("1", PK_A, PK_B, 10, "follow"),
            follow("2", PK_A, PK_B, 20, "unfollow"),
        ];
        let graph = RelationGraph::from_records(&records);
        assert!(!graph.is_following(PK_A, PK_B));

        let graph = RelationGraph::from_records(records.iter().rev());
        assert!(!graph.is_following(PK_A, PK_B));
    }

    #[test]
    fn later_unblock_wins() {
        let records = vec![
            block("2", PK_A, PK_B, 30, "unblock"),
            block("1", PK_A, PK_B, 10, "block"),
        ];
        let graph = RelationGraph::from_records(&records);
        assert!(!graph.is_blocking(PK_A, PK_B));
        assert!(graph.blocked_by(PK_A).is_empty());

        let graph = RelationGraph::from_records(&records[1..]);
        assert!(graph.is_blocking(PK_A, PK_B));
        assert_eq!(graph.blocked_by(PK_A), vec![PK_B]);
    }

    #[test]
    fn ties_break_on_id() {
        let records = vec![
            follow("b", PK_A, PK_B, 10, "follow"),
            follow("a", PK_A, PK_B, 10, "unfollow"),
        ];
        assert!(RelationGraph::from_records(&records).is_following(PK_A, PK_B));
        assert!(RelationGraph::from_records(records.iter().rev()).is_following(PK_A, PK_B));
    }

    #[test]
    fn relations_are_directional() {
        let graph = RelationGraph::from_records(&[follow("1", PK_A, PK_B, 1, "follow")]);
        assert!(graph.is_following(PK_A, PK_B));
        assert!(!graph.is_following(PK_B, PK_A));
        assert_eq!(graph.followers_of(PK_B), vec![PK_A]);
        assert_eq!(graph.following_of(PK_A), vec![PK_B]);
    }

    #[test]
    fn vote_tally_counts_latest_vote_per_voter() {
        let records = vec![
            vote("1", PK_A, "p1", 1, "upvote"),
            vote("2", PK_A, "p1", 2, "downvote"),
            vote("3", PK_B, "p1", 1, "upvote"),
            vote("4", PK_C, "p2", 1, "upvote"),
        ];
        let graph = RelationGraph::from_records(&records);
        assert_eq!(graph.vote(PK_A, "p1"), Some(VoteKind::Downvote));
        assert_eq!(graph.vote_tally("p1"), (1, 1));
        assert_eq!(graph.vote_tally("p2"), (1, 0));
        assert_eq!(graph.vote(PK_B, "p2"), None);
    }

    #[test]
    fn latest_record_picks_newest() {
        let records = vec![
            vote("1", PK_A, "p1", 5, "upvote"),
            vote("2", PK_A, "p1", 9, "upvote"),
            vote("3", PK_A, "p1", 7, "upvote"),
        ];
        assert_eq!(latest_record(&records).unwrap().id, "2");
        let none: Vec<DecodedRecord> = vec![];
        assert!(latest_record(&none).is_none());
    }

    quickcheck! {
        fn follow_state_is_order_independent(stamps: Vec<(u8, bool)>, rotation: usize) -> TestResult {
            if stamps.is_empty() {
                return TestResult::discard();
            }

            let records: Vec<DecodedRecord> = stamps
                .iter()
                .enumerate()
                .map(|(i, (ts, on))| {
                    let action = if *on { "follow" } else { "unfollow" };
                    follow(&i.to_string(), PK_A, PK_B, i64::from(*ts), action)
                })
                .collect();

            let mut shuffled = records.clone();
            shuffled.rotate_left(rotation % records.len());
            shuffled.reverse();

            TestResult::from_bool(
                RelationGraph::from_records(&records).is_following(PK_A, PK_B)
                    == RelationGraph::from_records(&shuffled).is_following(PK_A, PK_B),
            )
        }

        fn block_state_is_order_independent(stamps: Vec<(u8, bool)>, rotation: usize) -> TestResult {
            if stamps.is_empty() {
                return TestResult::discard();
            }

            let records: Vec<DecodedRecord> = stamps
                .iter()
                .enumerate()
                .map(|(i, (ts, on))| {
                    let action = if *on { "block" } else { "unblock" };
                    block(&i.to_string(), PK_A, PK_B, i64::from(*ts), action)
                })
                .collect();

            let mut shuffled = records.clone();
            shuffled.rotate_left(rotation % records.len());
            shuffled.reverse();

            let in_order = RelationGraph::from_records(&records);
            let reordered = RelationGraph::from_records(&shuffled);
            let expected = latest_record(&records)
                .and_then(|r| r.field(FIELD_BLOCKING_ACTION))
                == Some("block");

            TestResult::from_bool(
                in_order.is_blocking(PK_A, PK_B) == expected
                    && reordered.is_blocking(PK_A, PK_B) == expected
                    && reordered.blocked_by(PK_A) == in_order.blocked_by(PK_A),
            )
        }
    }
}
