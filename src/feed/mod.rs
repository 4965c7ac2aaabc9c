// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Reconstruction of display-ready objects from indexer responses and
//! classified ledger records, relative to a viewing identity.

mod author;
mod mentions;
mod notification;
mod overlay;
mod page;
mod post;
mod profile;
pub(crate) mod relation;
mod time;

pub use crate::feed::author::*;
pub use crate::feed::mentions::*;
pub use crate::feed::notification::*;
pub use crate::feed::overlay::*;
pub use crate::feed::page::*;
pub use crate::feed::post::*;
pub use crate::feed::profile::*;
pub use crate::feed::relation::*;
pub use crate::feed::time::*;
