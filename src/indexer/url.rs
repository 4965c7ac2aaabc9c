// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCHEME: Regex = Regex::new(r"(?i)^https?://").unwrap();
    static ref IPV4_HOST: Regex = Regex::new(r"^(\d{1,3}\.){3}\d{1,3}(:\d+)?$").unwrap();
}

/// Normalizes a user supplied indexer base URL.
///
/// Trailing slashes are removed. Relative paths and URLs with an explicit
/// scheme are kept. Bare IPv4 hosts get `http://`, any other host `https://`.
#[must_use]
pub fn normalize_api_url(url: &str) -> String {
    let normalized = url.trim().trim_end_matches('/');

    if normalized.is_empty() || normalized.starts_with('/') || SCHEME.is_match(normalized) {
        return normalized.to_owned();
    }

    if IPV4_HOST.is_match(normalized) {
        format!("http://{normalized}")
    } else {
        format!("https://{normalized}")
    }
}
