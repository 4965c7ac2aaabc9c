// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Read side: paginated queries against the indexing service.

mod client;
mod types;
mod url;

pub use crate::indexer::client::*;
pub use crate::indexer::types::*;
pub use crate::indexer::url::*;
