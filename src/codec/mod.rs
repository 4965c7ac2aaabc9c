// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! K-protocol wire codec.
//!
//! Actions are turned into a canonical signing string and a colon delimited
//! wire payload; payloads found on the ledger are classified back into
//! [`DecodedRecord`]s. Both directions are driven by the table in
//! [`schema`](crate::codec::ActionKind::fields).

mod action;
mod payload;
mod record;
mod schema;
mod text;

pub use crate::codec::action::*;
pub use crate::codec::payload::*;
pub use crate::codec::record::*;
pub use crate::codec::schema::*;
pub use crate::codec::text::*;
