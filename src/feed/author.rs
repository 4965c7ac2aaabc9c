// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Address, Network};
use serde::{Deserialize, Serialize};
use std::fmt;

const KASPA_PREFIX: &str = "kaspa:";
const SHORT_PREFIX_CHARS: usize = 4;
const SHORT_SUFFIX_CHARS: usize = 4;

pub const SELF_DISPLAY_NAME: &str = "You";
pub const DEFAULT_ADDRESS_PREFIX_LEN: usize = 8;
pub const DEFAULT_ADDRESS_SUFFIX_LEN: usize = 8;
pub const DEFAULT_PUBKEY_DISPLAY_LEN: usize = 20;

/// Character aware `first...last`.
fn shorten(value: &str, prefix_len: usize, suffix_len: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let prefix: String = chars[..prefix_len.min(chars.len())].iter().collect();
    let suffix: String = chars[chars.len().saturating_sub(suffix_len)..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Nickname, then `You` for the viewer, then the shortened pubkey.
#[must_use]
pub fn display_name(pubkey: &str, viewer: Option<&str>, nickname: Option<&str>) -> String {
    if let Some(nickname) = nickname.filter(|n| !n.trim().is_empty()) {
        return nickname.to_owned();
    }

    if viewer == Some(pubkey) {
        return SELF_DISPLAY_NAME.to_owned();
    }

    if pubkey.chars().count() >= SHORT_PREFIX_CHARS + SHORT_SUFFIX_CHARS {
        shorten(pubkey, SHORT_PREFIX_CHARS, SHORT_SUFFIX_CHARS)
    } else {
        pubkey.to_owned()
    }
}

#[must_use]
pub fn truncate_kaspa_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    if address.chars().count() <= 15 {
        return address.to_owned();
    }

    match address.strip_prefix(KASPA_PREFIX) {
        Some(body) if body.chars().count() <= prefix_len + suffix_len => address.to_owned(),
        Some(body) => format!("{KASPA_PREFIX}{}", shorten(body, prefix_len, suffix_len)),
        None => shorten(address, prefix_len, suffix_len),
    }
}

#[must_use]
pub fn format_public_key_for_display(pubkey: &str, max_len: usize) -> String {
    if pubkey.chars().count() <= max_len {
        pubkey.to_owned()
    } else {
        shorten(pubkey, SHORT_PREFIX_CHARS, SHORT_SUFFIX_CHARS)
    }
}

/// Kaspa address for a pubkey, or the pubkey itself when it cannot be
/// converted.
#[must_use]
pub fn pubkey_to_address_or_pubkey(pubkey: &str, network: Network) -> String {
    Address::from_public_key_hex(pubkey, network)
        .map(|address| address.encode())
        .unwrap_or_else(|_| pubkey.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Avatar {
    /// `data:` URL of an uploaded PNG.
    Image(String),

    /// Generated from the pubkey.
    Identicon(String),
}

impl Avatar {
    #[must_use]
    pub fn new(pubkey: &str, profile_image: Option<&str>) -> Self {
        match profile_image.map(str::trim).filter(|img| !img.is_empty()) {
            Some(image) => Self::Image(format!("data:image/png;base64,{image}")),
            None => Self::Identicon(pubkey.to_owned()),
        }
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(url) => f.write_str(url),
            Self::Identicon(pubkey) => write!(f, "identicon:{pubkey}"),
        }
    }
}

/// Author block attached to every rendered post. `pubkey` is always the raw
/// key so reply chains can be rebuilt from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,

    /// Full Kaspa address, pubkey if it could not be derived.
    pub username: String,
    pub avatar: Avatar,
    pub pubkey: String,
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
}

impl AuthorInfo {
    #[must_use]
    pub fn new(
        pubkey: &str,
        ctx: &ViewContext,
        nickname: Option<String>,
        profile_image: Option<String>,
    ) -> Self {
        Self {
            name: display_name(pubkey, ctx.viewer.as_deref(), nickname.as_deref()),
            username: pubkey_to_address_or_pubkey(pubkey, ctx.network),
            avatar: Avatar::new(pubkey, profile_image.as_deref()),
            pubkey: pubkey.to_owned(),
            nickname,
            profile_image,
        }
    }
}

/// Who is looking, on which network, at what time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub viewer: Option<String>,
    pub network: Network,

    /// Milliseconds since the unix epoch.
    pub now_ms: i64,
}

impl ViewContext {
    #[must_use]
    pub fn new(viewer: Option<String>, network: Network) -> Self {
        Self {
            viewer,
            network,
            now_ms: crate::feed::now_millis(),
        }
    }

    #[must_use]
    pub fn at(mut self, now_ms: i64) -> Self {
        self.now_ms = now_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PK: &str = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaabcde";

    #[test]
    fn display_name_priority() {
        assert_eq!(display_name(PK, Some(PK), Some("Alice")), "Alice");
        assert_eq!(display_name(PK, Some(PK), Some("   ")), "You");
        assert_eq!(display_name(PK, Some(PK), None), "You");
        assert_eq!(display_name(PK, None, None), "02aa...bcde");
        assert_eq!(display_name(PK, Some("03ff"), None), "02aa...bcde");
        assert_eq!(display_name("abc", None, None), "abc");
    }

    #[test]
    fn address_truncation() {
        let address = format!("kaspa:{}", "qz".repeat(30));
        assert_eq!(
            truncate_kaspa_address(&address, 8, 8),
            "kaspa:qzqzqzqz...qzqzqzqz"
        );
        assert_eq!(truncate_kaspa_address("kaspa:qzqz", 8, 8), "kaspa:qzqz");
        assert_eq!(
            truncate_kaspa_address("kaspa:0123456789abcdef", 8, 8),
            "kaspa:0123456789abcdef"
        );
        assert_eq!(
            truncate_kaspa_address("kaspatest:0123456789abcdefghij", 8, 8),
            "kaspates...cdefghij"
        );
    }

    #[test]
    fn pubkey_display() {
        assert_eq!(format_public_key_for_display("0123456789", 20), "0123456789");
        assert_eq!(format_public_key_for_display(PK, 20), "02aa...bcde");
    }

    #[test]
    fn avatar_is_never_blank() {
        assert_eq!(
            Avatar::new(PK, Some("iVBOR")),
            Avatar::Image("data:image/png;base64,iVBOR".to_owned())
        );
        assert_eq!(Avatar::new(PK, Some(" ")), Avatar::Identicon(PK.to_owned()));
        assert_eq!(Avatar::new(PK, None), Avatar::Identicon(PK.to_owned()));
        assert!(!Avatar::new(PK, None).to_string().is_empty());
    }

    #[test]
    fn author_username_is_an_address() {
        let ctx = ViewContext::new(None, Network::Mainnet);
        let author = AuthorInfo::new(PK, &ctx, Some("Bob".to_owned()), None);
        assert!(author.username.starts_with("kaspa:"));
        assert_eq!(author.name, "Bob");
        assert_eq!(author.pubkey, PK);

        let author = AuthorInfo::new("not-a-key", &ctx, None, None);
        assert_eq!(author.username, "not-a-key");
    }
}
