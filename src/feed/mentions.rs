// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::feed::Post;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MENTION: Regex = Regex::new(r"@([0-9a-fA-F]{66})").unwrap();
}

/// Placeholder usernames that must never end up in a mention list.
const PLACEHOLDER_MENTIONS: &[&str] = &["", "you"];

/// A `@pubkey` occurrence. Offsets are byte offsets covering the `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub pubkey: String,
    pub start: usize,
    pub end: usize,
}

#[must_use]
pub fn detect_mentions_in_text(text: &str) -> Vec<Mention> {
    MENTION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let pubkey = caps.get(1)?;
            Some(Mention {
                pubkey: pubkey.as_str().to_owned(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Mention list for a reply to `target`: its author first, then everyone it
/// already mentions, so the whole conversation keeps being notified.
#[must_use]
pub fn build_mentioned_pubkeys_for_reply(target: &Post) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(1 + target.mentioned_pubkeys.len());
    let candidates = std::iter::once(&target.author.pubkey).chain(target.mentioned_pubkeys.iter());

    for pubkey in candidates {
        if pubkey.trim().is_empty() || PLACEHOLDER_MENTIONS.contains(&pubkey.as_str()) {
            continue;
        }
        if !out.contains(pubkey) {
            out.push(pubkey.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_text;
    use crate::feed::ViewContext;
    use crate::indexer::ServerReply;
    use crate::primitives::Network;

    const PK_A: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const PK_B: &str = "03bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const PK_C: &str = "02cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";

    fn reply(author: &str, mentions: Vec<&str>) -> Post {
        let server = ServerReply {
            id: "r1".to_owned(),
            user_public_key: author.to_owned(),
            post_content: encode_text("re"),
            signature: "ff".to_owned(),
            timestamp: 0,
            replies_count: 0,
            up_votes_count: 0,
            down_votes_count: 0,
            quotes_count: 0,
            reposts_count: 0,
            parent_post_id: Some("p0".to_owned()),
            mentioned_pubkeys: Some(mentions.into_iter().map(str::to_owned).collect()),
            is_upvoted: None,
            is_downvoted: None,
            user_nickname: None,
            user_profile_image: None,
        };
        Post::from_server_reply(&server, &ViewContext::new(None, Network::Mainnet).at(0))
    }

    #[test]
    fn reply_mentions_keep_chain_order() {
        let target = reply(PK_B, vec![PK_A, PK_C, PK_B, "", "you", PK_A]);
        assert_eq!(
            build_mentioned_pubkeys_for_reply(&target),
            vec![PK_B.to_owned(), PK_A.to_owned(), PK_C.to_owned()]
        );
    }

    #[test]
    fn root_post_mentions_only_author() {
        let target = reply(PK_A, vec![]);
        assert_eq!(build_mentioned_pubkeys_for_reply(&target), vec![PK_A.to_owned()]);
    }

    #[test]
    fn it_detects_mentions() {
        let text = format!("hi @{PK_A} and @{PK_B}! @02abc");
        let mentions = detect_mentions_in_text(&text);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].pubkey, PK_A);
        assert_eq!(mentions[0].start, 3);
        assert_eq!(mentions[0].end, 3 + 67);
        assert_eq!(&text[mentions[1].start..mentions[1].end], format!("@{PK_B}"));
    }
}
