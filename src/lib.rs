// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # K-protocol
//! Client side of a social network that uses the Kaspa ledger as transport and data availability
//! layer. Every user action is a short signed text record embedded as the payload of an ordinary
//! ledger transaction.
//!
//! ## Wire format
//! `k:1:<action>:<sender pubkey>:<signature>:<fields...>`
//!
//! * **post**: `<base64 message>:<json mentioned pubkeys>`
//! * **reply**: `<post id>:<base64 message>:<json mentioned pubkeys>`
//! * **broadcast**: `<base64 nickname>:<base64 profile image or empty>:<base64 message>`
//! * **vote**: `<post id>:<upvote|downvote>:<mentioned pubkey>`
//! * **block**: `<block|unblock>:<blocked pubkey>`
//! * **follow**: `<follow|unfollow>:<followed pubkey>`
//! * **quote**: `<post id>:<base64 message>:<mentioned pubkey>`
//!
//! The signature is a Schnorr signature over the BLAKE2b personal message hash of the action's
//! content fields joined by `:`, in the order listed above. The `k` and version segments, the
//! action name and the sender pubkey are not signed.
//!
//! ## Layout
//! * [`codec`]: actions, payload encoding and record classification
//! * [`primitives`]: keys, addresses, networks and amounts
//! * [`wallet`]: submission of signed actions through an injected ledger client
//! * [`indexer`]: typed client for the indexer API
//! * [`feed`]: reconstruction of posts, profiles, relations and notifications

#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod feed;
pub mod indexer;
pub mod primitives;
pub mod settings;
pub mod wallet;
