// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Compact age of `then_ms` relative to `now_ms`, both in milliseconds.
/// Timestamps in the future render as `now`.
#[must_use]
pub fn format_relative_time(now_ms: i64, then_ms: i64) -> String {
    let age = now_ms.saturating_sub(then_ms);

    if age >= DAY_MS {
        format!("{}d", age / DAY_MS)
    } else if age >= HOUR_MS {
        format!("{}h", age / HOUR_MS)
    } else if age >= MINUTE_MS {
        format!("{}m", age / MINUTE_MS)
    } else {
        "now".to_owned()
    }
}
