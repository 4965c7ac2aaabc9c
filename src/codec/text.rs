// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use log::*;
use std::fmt;

/// Substituted for any free-text field that cannot be decoded.
pub const UNDECODABLE_PLACEHOLDER: &str = "[Unable to decode content]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErr {
    /// Input is not valid standard Base64.
    InvalidBase64,

    /// Decoded bytes are not valid UTF-8.
    InvalidUtf8,

    /// A wire field had an unexpected shape.
    MalformedField(&'static str),
}

impl fmt::Display for DecodeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64 => write!(f, "invalid base64"),
            Self::InvalidUtf8 => write!(f, "decoded content is not utf-8"),
            Self::MalformedField(field) => write!(f, "malformed field: {field}"),
        }
    }
}

impl std::error::Error for DecodeErr {}

/// Encodes UTF-8 text into standard Base64 over its bytes. The output never
/// contains `:`.
#[must_use]
pub fn encode_text(text: &str) -> String {
    base64::encode(text.as_bytes())
}

/// Decodes a Base64 field back into UTF-8 text.
pub fn decode_text(encoded: &str) -> Result<String, DecodeErr> {
    let bytes = base64::decode(encoded).map_err(|_| DecodeErr::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| DecodeErr::InvalidUtf8)
}

/// Decodes a Base64 field, falling back to [`UNDECODABLE_PLACEHOLDER`] so one
/// corrupt record never breaks a whole batch.
#[must_use]
pub fn decode_text_or_placeholder(encoded: &str) -> String {
    match decode_text(encoded) {
        Ok(text) => text,
        Err(err) => {
            warn!("Could not decode content field: {err}");
            UNDECODABLE_PLACEHOLDER.to_owned()
        }
    }
}

/// Decodes an optional Base64 field, treating failures and empty results as
/// absent.
#[must_use]
pub fn decode_optional_text(encoded: Option<&str>) -> Option<String> {
    let encoded = encoded?;
    if encoded.is_empty() {
        return None;
    }

    match decode_text(encoded) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("Could not decode optional field: {err}");
            None
        }
    }
}

/// True if the string only uses the standard Base64 alphabet and padding.
#[must_use]
pub fn is_base64_alphabet(encoded: &str) -> bool {
    encoded
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}
