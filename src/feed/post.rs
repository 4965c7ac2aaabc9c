// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{
    decode_optional_text, decode_text_or_placeholder, ActionKind, DecodedRecord, VoteKind,
    FIELD_MESSAGE, FIELD_POST_ID, UNDECODABLE_PLACEHOLDER,
};
use crate::feed::{format_relative_time, AuthorInfo, RelationGraph, UserProfile, ViewContext};
use crate::indexer::{ServerPost, ServerQuoteData, ServerReply, ServerUserPost};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteData {
    pub referenced_id: Option<String>,
    pub referenced_message: String,
    pub referenced_sender_pubkey: String,
    pub referenced_nickname: Option<String>,
    pub referenced_profile_image: Option<String>,
}

impl From<&ServerQuoteData> for QuoteData {
    fn from(quote: &ServerQuoteData) -> Self {
        Self {
            referenced_id: Some(quote.referenced_content_id.clone()),
            referenced_message: decode_text_or_placeholder(&quote.referenced_message),
            referenced_sender_pubkey: quote.referenced_sender_pubkey.clone(),
            referenced_nickname: decode_optional_text(quote.referenced_nickname.as_deref()),
            referenced_profile_image: quote.referenced_profile_image.clone(),
        }
    }
}

/// Display-ready post or reply. Content never changes after construction,
/// only counters and viewer flags differ between fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: AuthorInfo,
    pub content: String,

    /// Relative age such as `5m`.
    pub timestamp: String,

    /// Milliseconds since the unix epoch.
    pub timestamp_ms: i64,
    pub up_votes: u64,
    pub down_votes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub quotes: u64,
    pub up_voted: bool,
    pub down_voted: bool,
    pub reposted: bool,
    pub nested_replies: Vec<Post>,
    pub parent_post_id: Option<String>,
    pub mentioned_pubkeys: Vec<String>,
    pub is_quote: bool,
    pub quote: Option<QuoteData>,
}

impl Post {
    fn bare(
        id: &str,
        pubkey: &str,
        encoded_content: &str,
        timestamp_ms: i64,
        nickname: Option<&str>,
        profile_image: Option<&str>,
        ctx: &ViewContext,
    ) -> Self {
        let nickname = decode_optional_text(nickname);
        Self {
            id: id.to_owned(),
            author: AuthorInfo::new(pubkey, ctx, nickname, profile_image.map(str::to_owned)),
            content: decode_text_or_placeholder(encoded_content),
            timestamp: format_relative_time(ctx.now_ms, timestamp_ms),
            timestamp_ms,
            up_votes: 0,
            down_votes: 0,
            reposts: 0,
            replies: 0,
            quotes: 0,
            up_voted: false,
            down_voted: false,
            reposted: false,
            nested_replies: vec![],
            parent_post_id: None,
            mentioned_pubkeys: vec![],
            is_quote: false,
            quote: None,
        }
    }

    #[must_use]
    pub fn from_server_post(post: &ServerPost, ctx: &ViewContext) -> Self {
        let quote = post.quote.as_ref().map(QuoteData::from);
        Self {
            up_votes: post.up_votes_count,
            down_votes: post.down_votes_count,
            reposts: post.reposts_count,
            replies: post.replies_count,
            quotes: post.quotes_count,
            up_voted: post.is_upvoted.unwrap_or(false),
            down_voted: post.is_downvoted.unwrap_or(false),
            parent_post_id: post.parent_post_id.clone(),
            mentioned_pubkeys: post.mentioned_pubkeys.clone().unwrap_or_default(),
            is_quote: post.is_quote.unwrap_or(false) && quote.is_some(),
            quote,
            ..Self::bare(
                &post.id,
                &post.user_public_key,
                &post.post_content,
                post.timestamp,
                post.user_nickname.as_deref(),
                post.user_profile_image.as_deref(),
                ctx,
            )
        }
    }

    #[must_use]
    pub fn from_server_reply(reply: &ServerReply, ctx: &ViewContext) -> Self {
        Self {
            up_votes: reply.up_votes_count,
            down_votes: reply.down_votes_count,
            reposts: reply.reposts_count,
            replies: reply.replies_count,
            quotes: reply.quotes_count,
            up_voted: reply.is_upvoted.unwrap_or(false),
            down_voted: reply.is_downvoted.unwrap_or(false),
            parent_post_id: reply.parent_post_id.clone(),
            mentioned_pubkeys: reply.mentioned_pubkeys.clone().unwrap_or_default(),
            ..Self::bare(
                &reply.id,
                &reply.user_public_key,
                &reply.post_content,
                reply.timestamp,
                reply.user_nickname.as_deref(),
                reply.user_profile_image.as_deref(),
                ctx,
            )
        }
    }

    /// User listings carry no counters, everything starts at zero.
    #[must_use]
    pub fn from_server_user_post(post: &ServerUserPost, ctx: &ViewContext) -> Self {
        Self::bare(
            &post.id,
            &post.user_public_key,
            &post.post_content,
            post.timestamp,
            post.user_nickname.as_deref(),
            post.user_profile_image.as_deref(),
            ctx,
        )
    }

    /// Builds a post from a locally classified post, reply or quote record.
    /// Counters are unknown without the indexer and start at zero.
    #[must_use]
    pub fn from_record(record: &DecodedRecord, ctx: &ViewContext) -> Option<Self> {
        if !matches!(
            record.action,
            ActionKind::Post | ActionKind::Reply | ActionKind::Quote
        ) {
            return None;
        }

        let mut post = Self::bare(
            &record.id,
            &record.sender_pubkey,
            record.field(FIELD_MESSAGE).unwrap_or_default(),
            record.timestamp,
            None,
            None,
            ctx,
        );
        post.mentioned_pubkeys = record.mentioned_pubkeys();

        match record.action {
            ActionKind::Reply => {
                post.parent_post_id = record.field(FIELD_POST_ID).map(str::to_owned);
            }
            ActionKind::Quote => {
                post.is_quote = true;
                post.quote = Some(QuoteData {
                    referenced_id: record.field(FIELD_POST_ID).map(str::to_owned),
                    referenced_message: String::new(),
                    referenced_sender_pubkey: post
                        .mentioned_pubkeys
                        .first()
                        .cloned()
                        .unwrap_or_default(),
                    referenced_nickname: None,
                    referenced_profile_image: None,
                });
            }
            _ => {}
        }

        Some(post)
    }

    /// Fills what a post built from a record lacks: the author's latest
    /// introduction and the resolved votes on this post.
    pub fn apply_local_state(
        &mut self,
        author: &UserProfile,
        graph: &RelationGraph,
        ctx: &ViewContext,
    ) {
        if author.pubkey == self.author.pubkey {
            self.author = AuthorInfo::new(
                &author.pubkey,
                ctx,
                author.nickname.clone(),
                author.profile_image.clone(),
            );
        }

        let (up, down) = graph.vote_tally(&self.id);
        self.up_votes = up;
        self.down_votes = down;

        let own = ctx
            .viewer
            .as_deref()
            .and_then(|viewer| graph.vote(viewer, &self.id));
        self.up_voted = own == Some(VoteKind::Upvote);
        self.down_voted = own == Some(VoteKind::Downvote);
    }

    #[must_use]
    pub fn is_undecodable(&self) -> bool {
        self.content == UNDECODABLE_PLACEHOLDER
    }
}

/// Newest first. The sort is stable so equal timestamps keep server order.
fn newest_first<T>(items: &[T], timestamp: impl Fn(&T) -> i64) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| timestamp(b).cmp(&timestamp(a)));
    sorted
}

#[must_use]
pub fn posts_from_server(posts: &[ServerPost], ctx: &ViewContext) -> Vec<Post> {
    newest_first(posts, |p| p.timestamp)
        .into_iter()
        .map(|p| Post::from_server_post(p, ctx))
        .collect()
}

#[must_use]
pub fn posts_from_server_replies(replies: &[ServerReply], ctx: &ViewContext) -> Vec<Post> {
    newest_first(replies, |r| r.timestamp)
        .into_iter()
        .map(|r| Post::from_server_reply(r, ctx))
        .collect()
}

#[must_use]
pub fn posts_from_server_users(posts: &[ServerUserPost], ctx: &ViewContext) -> Vec<Post> {
    newest_first(posts, |p| p.timestamp)
        .into_iter()
        .map(|p| Post::from_server_user_post(p, ctx))
        .collect()
}

/// Posts, replies and quotes among `records`, newest first, with author
/// introductions, votes and reply and quote counts resolved from the same
/// records.
#[must_use]
pub fn posts_from_records(records: &[DecodedRecord], ctx: &ViewContext) -> Vec<Post> {
    let graph = RelationGraph::from_records(records);
    let mut profiles: HashMap<&str, UserProfile> = HashMap::new();
    let mut replies: HashMap<&str, u64> = HashMap::new();
    let mut quotes: HashMap<&str, u64> = HashMap::new();

    for record in records {
        match record.action {
            ActionKind::Broadcast => {
                profiles
                    .entry(record.sender_pubkey.as_str())
                    .or_insert_with(|| UserProfile::empty(&record.sender_pubkey))
                    .apply_broadcast(record);
            }
            ActionKind::Reply => {
                if let Some(parent) = record.field(FIELD_POST_ID) {
                    *replies.entry(parent).or_default() += 1;
                }
            }
            ActionKind::Quote => {
                if let Some(quoted) = record.field(FIELD_POST_ID) {
                    *quotes.entry(quoted).or_default() += 1;
                }
            }
            _ => {}
        }
    }

    newest_first(records, |r| r.timestamp)
        .into_iter()
        .filter_map(|record| {
            let mut post = Post::from_record(record, ctx)?;
            let author = profiles
                .get(record.sender_pubkey.as_str())
                .cloned()
                .unwrap_or_else(|| UserProfile::empty(&record.sender_pubkey));
            post.apply_local_state(&author, &graph, ctx);
            post.replies = replies.get(record.id.as_str()).copied().unwrap_or(0);
            post.quotes = quotes.get(record.id.as_str()).copied().unwrap_or(0);
            Some(post)
        })
        .collect()
}

/// Depth first search through posts and their nested replies.
#[must_use]
pub fn find_post_by_id<'a>(posts: &'a [Post], id: &str) -> Option<&'a Post> {
    posts.iter().find_map(|post| {
        if post.id == id {
            Some(post)
        } else {
            find_post_by_id(&post.nested_replies, id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_action, encode_text, Action};
    use crate::primitives::{Network, PrivateKey};

    const PK_A: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const PK_B: &str = "03bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const NOW: i64 = 1_700_000_000_000;

    fn ctx() -> ViewContext {
        ViewContext::new(Some(PK_A.to_owned()), Network::Mainnet).at(NOW)
    }

    fn server_post(id: &str, timestamp: i64) -> ServerPost {
        ServerPost {
            id: id.to_owned(),
            user_public_key: PK_B.to_owned(),
            post_content: encode_text("Hello 👋"),
            signature: "ff".to_owned(),
            timestamp,
            replies_count: 1,
            up_votes_count: 2,
            down_votes_count: 3,
            quotes_count: 4,
            reposts_count: 5,
            parent_post_id: None,
            mentioned_pubkeys: None,
            is_upvoted: Some(true),
            is_downvoted: None,
            user_nickname: Some(encode_text("Bob")),
            user_profile_image: None,
            is_quote: None,
            quote: None,
        }
    }

    #[test]
    fn it_converts_a_server_post() {
        let post = Post::from_server_post(&server_post("p1", NOW - 120_000), &ctx());
        assert_eq!(post.content, "Hello 👋");
        assert_eq!(post.timestamp, "2m");
        assert_eq!(post.author.name, "Bob");
        assert_eq!(post.author.nickname.as_deref(), Some("Bob"));
        assert_eq!(
            (post.up_votes, post.down_votes, post.quotes, post.reposts, post.replies),
            (2, 3, 4, 5, 1)
        );
        assert!(post.up_voted);
        assert!(!post.down_voted);
        assert!(!post.reposted);
        assert!(post.mentioned_pubkeys.is_empty());
        assert!(!post.is_quote);
    }

    #[test]
    fn corrupt_content_uses_placeholder() {
        let mut server = server_post("p1", NOW);
        server.post_content = "%%%".to_owned();
        server.user_nickname = Some("%%%".to_owned());
        let post = Post::from_server_post(&server, &ctx());
        assert!(post.is_undecodable());
        assert_eq!(post.author.nickname, None);
        assert_eq!(post.author.name, "03bb...bbbb");
    }

    #[test]
    fn it_converts_quotes() {
        let mut server = server_post("q1", NOW);
        server.is_quote = Some(true);
        server.quote = Some(ServerQuoteData {
            referenced_content_id: "p0".to_owned(),
            referenced_message: encode_text("original"),
            referenced_sender_pubkey: PK_A.to_owned(),
            referenced_nickname: Some(encode_text("Alice")),
            referenced_profile_image: None,
        });

        let post = Post::from_server_post(&server, &ctx());
        assert!(post.is_quote);
        let quote = post.quote.unwrap();
        assert_eq!(quote.referenced_id.as_deref(), Some("p0"));
        assert_eq!(quote.referenced_message, "original");
        assert_eq!(quote.referenced_nickname.as_deref(), Some("Alice"));
    }

    #[test]
    fn pages_are_sorted_newest_first() {
        let page = vec![
            server_post("old", NOW - 10),
            server_post("new", NOW),
            server_post("mid", NOW - 5),
        ];
        let ids: Vec<String> = posts_from_server(&page, &ctx())
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn user_posts_have_no_counters() {
        let server = ServerUserPost {
            id: "u1".to_owned(),
            user_public_key: PK_A.to_owned(),
            post_content: encode_text("Hi, I'm me"),
            signature: "ff".to_owned(),
            timestamp: NOW,
            user_nickname: None,
            user_profile_image: Some("iVBOR".to_owned()),
        };
        let post = Post::from_server_user_post(&server, &ctx());
        assert_eq!(post.author.name, "You");
        assert_eq!(post.up_votes + post.replies + post.quotes, 0);
        assert_eq!(post.timestamp, "now");
    }

    #[test]
    fn it_builds_posts_from_records() {
        let key = PrivateKey::random();
        let signed = encode_action(&Action::reply("p0", "Hey", vec![PK_A.to_owned()]), &key).unwrap();
        let record = DecodedRecord::classify(signed.payload.as_str(), "r1", NOW - 7_200_000).unwrap();

        let post = Post::from_record(&record, &ctx()).unwrap();
        assert_eq!(post.content, "Hey");
        assert_eq!(post.parent_post_id.as_deref(), Some("p0"));
        assert_eq!(post.mentioned_pubkeys, vec![PK_A.to_owned()]);
        assert_eq!(post.timestamp, "2h");

        let signed = encode_action(&Action::broadcast("Bob", None, "bio"), &key).unwrap();
        let record = DecodedRecord::classify(signed.payload.as_str(), "b1", NOW).unwrap();
        assert!(Post::from_record(&record, &ctx()).is_none());
    }

    #[test]
    fn local_posts_use_latest_introduction_and_votes() {
        let author = PrivateKey::random();
        let author_pk = author.public_key().unwrap().to_hex();
        let voter = PrivateKey::random();
        let classify = |action: Action, key: &PrivateKey, id: &str, ts: i64| {
            let signed = encode_action(&action, key).unwrap();
            DecodedRecord::classify(signed.payload.as_str(), id, ts).unwrap()
        };

        let records = vec![
            classify(Action::broadcast("Old", None, "bio"), &author, "b1", NOW - 50),
            classify(Action::broadcast("Carol", Some("iVBOR".to_owned()), "bio"), &author, "b2", NOW - 40),
            classify(Action::post("gm", vec![]), &author, "p1", NOW - 30),
            classify(Action::vote("p1", VoteKind::Downvote, author_pk.clone()), &voter, "v1", NOW - 20),
            classify(Action::vote("p1", VoteKind::Upvote, author_pk.clone()), &voter, "v2", NOW - 10),
            classify(Action::reply("p1", "hi", vec![author_pk.clone()]), &voter, "r1", NOW),
        ];

        let viewer = voter.public_key().unwrap().to_hex();
        let ctx = ViewContext::new(Some(viewer), Network::Mainnet).at(NOW);
        let posts = posts_from_records(&records, &ctx);
        assert_eq!(
            posts.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["r1", "p1"]
        );

        let post = find_post_by_id(&posts, "p1").unwrap();
        assert_eq!(post.author.name, "Carol");
        assert_eq!(post.author.profile_image.as_deref(), Some("iVBOR"));
        assert_eq!((post.up_votes, post.down_votes), (1, 0));
        assert!(post.up_voted);
        assert!(!post.down_voted);
        assert_eq!(post.replies, 1);

        let reply = find_post_by_id(&posts, "r1").unwrap();
        assert_ne!(reply.author.name, "Carol");
        assert_eq!(reply.parent_post_id.as_deref(), Some("p1"));
    }

    #[test]
    fn other_viewers_see_no_own_vote() {
        let mut post = Post::from_server_user_post(
            &ServerUserPost {
                id: "p1".to_owned(),
                user_public_key: PK_B.to_owned(),
                post_content: encode_text("gm"),
                signature: "ff".to_owned(),
                timestamp: NOW,
                user_nickname: None,
                user_profile_image: None,
            },
            &ctx(),
        );
        let graph = RelationGraph::from_records(&[crate::feed::relation::tests::record(
            "v1",
            PK_B,
            NOW,
            ActionKind::Vote,
            &[
                (FIELD_POST_ID, "p1"),
                (crate::codec::FIELD_VOTE, "downvote"),
                (crate::codec::FIELD_MENTIONED_PUBKEY, PK_B),
            ],
        )]);

        post.apply_local_state(&UserProfile::empty(PK_A), &graph, &ctx());
        assert_eq!((post.up_votes, post.down_votes), (0, 1));
        assert!(!post.up_voted && !post.down_voted);
        assert_eq!(post.author.name, "03bb...bbbb");
    }

    #[test]
    fn it_finds_nested_posts() {
        let mut root = Post::from_server_post(&server_post("root", NOW), &ctx());
        let mut child = Post::from_server_post(&server_post("child", NOW), &ctx());
        child
            .nested_replies
            .push(Post::from_server_post(&server_post("grandchild", NOW), &ctx()));
        root.nested_replies.push(child);
        let posts = vec![root];

        assert_eq!(find_post_by_id(&posts, "grandchild").unwrap().id, "grandchild");
        assert!(find_post_by_id(&posts, "missing").is_none());
    }
}
