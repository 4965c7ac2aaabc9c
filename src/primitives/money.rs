// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use rust_decimal::Decimal;

pub const SOMPI_DECIMALS: u32 = 8;
pub const SOMPI_PER_KAS: u64 = 100_000_000;

/// Renders an amount in sompi as KAS without trailing zeros.
#[must_use]
pub fn sompi_to_kas_string(sompi: u64) -> String {
    Decimal::from_i128_with_scale(i128::from(sompi), SOMPI_DECIMALS)
        .normalize()
        .to_string()
}
