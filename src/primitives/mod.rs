// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

mod address;
mod keys;
mod money;
mod network;
mod sig;

pub use crate::primitives::address::*;
pub use crate::primitives::keys::*;
pub use crate::primitives::money::*;
pub use crate::primitives::network::*;
pub use crate::primitives::sig::*;
