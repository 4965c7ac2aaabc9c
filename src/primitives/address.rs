// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Network, PublicKey};
use bech32::{u5, FromBase32, ToBase32};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const CHECKSUM_LEN: usize = 8;
const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressErr {
    MissingPrefix,
    InvalidPrefix,
    InvalidCharacter,
    InvalidChecksum,
    InvalidLength,
    InvalidVersion,
}

impl fmt::Display for AddressErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingPrefix => "missing address prefix",
            Self::InvalidPrefix => "invalid address prefix",
            Self::InvalidCharacter => "invalid address character",
            Self::InvalidChecksum => "invalid address checksum",
            Self::InvalidLength => "invalid address length",
            Self::InvalidVersion => "invalid address version",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for AddressErr {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressVersion {
    /// Schnorr x-only public key.
    PubKey = 0,

    /// ECDSA compressed public key.
    PubKeyEcdsa = 1,

    ScriptHash = 8,
}

impl AddressVersion {
    fn payload_len(&self) -> usize {
        match self {
            Self::PubKey => 32,
            Self::PubKeyEcdsa => 33,
            Self::ScriptHash => 32,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, AddressErr> {
        match byte {
            0 => Ok(Self::PubKey),
            1 => Ok(Self::PubKeyEcdsa),
            8 => Ok(Self::ScriptHash),
            _ => Err(AddressErr::InvalidVersion),
        }
    }
}

/// Kaspa address: network prefix, version byte and payload, encoded in the
/// cashaddr style with a 40 bit checksum.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub network: Network,
    pub version: AddressVersion,
    pub payload: Vec<u8>,
}

impl Address {
    #[must_use]
    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        Self {
            network,
            version: AddressVersion::PubKey,
            payload: public_key.x_only().to_vec(),
        }
    }

    /// Convenience for display code that only has a hex key at hand.
    pub fn from_public_key_hex(public_key: &str, network: Network) -> Result<Self, AddressErr> {
        let public_key = PublicKey::from_hex(public_key).map_err(|_| AddressErr::InvalidLength)?;
        Ok(Self::from_public_key(&public_key, network))
    }

    /// Recovers a compressed public key hex from a Schnorr address. The parity
    /// is not carried by the address so the even form is returned.
    pub fn to_public_key_hex(&self) -> Result<String, AddressErr> {
        if self.version != AddressVersion::PubKey {
            return Err(AddressErr::InvalidVersion);
        }

        Ok(format!("02{}", hex::encode(&self.payload)))
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(1 + self.payload.len());
        raw.push(self.version as u8);
        raw.extend_from_slice(&self.payload);

        let data: Vec<u8> = raw.to_base32().into_iter().map(u5::to_u8).collect();
        let prefix = self.network.address_prefix();
        let checksum = checksum(prefix, &data).to_be_bytes();
        let checksum_data: Vec<u8> = (&checksum[3..])
            .to_base32()
            .into_iter()
            .map(u5::to_u8)
            .collect();

        let body: String = data
            .iter()
            .chain(checksum_data.iter())
            .map(|c| CHARSET[*c as usize] as char)
            .collect();

        format!("{prefix}:{body}")
    }

    pub fn decode(encoded: &str) -> Result<Self, AddressErr> {
        let (prefix, body) = encoded.split_once(':').ok_or(AddressErr::MissingPrefix)?;
        let network = [Network::Mainnet, Network::Testnet10]
            .into_iter()
            .find(|network| network.address_prefix() == prefix)
            .ok_or(AddressErr::InvalidPrefix)?;

        if body.len() <= CHECKSUM_LEN {
            return Err(AddressErr::InvalidLength);
        }

        let values = body
            .bytes()
            .map(|c| {
                CHARSET
                    .iter()
                    .position(|x| *x == c)
                    .map(|p| p as u8)
                    .ok_or(AddressErr::InvalidCharacter)
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let (data, checksum_data) = values.split_at(values.len() - CHECKSUM_LEN);
        let checksum_bytes = from_5bit(checksum_data)?;
        let mut be = [0u8; 8];
        be[3..].copy_from_slice(&checksum_bytes);
        if u64::from_be_bytes(be) != checksum(prefix, data) {
            return Err(AddressErr::InvalidChecksum);
        }

        let raw = from_5bit(data)?;
        let (version, payload) = raw.split_first().ok_or(AddressErr::InvalidLength)?;
        let version = AddressVersion::from_byte(*version)?;
        if payload.len() != version.payload_len() {
            return Err(AddressErr::InvalidLength);
        }

        Ok(Self {
            network,
            version,
            payload: payload.to_vec(),
        })
    }
}

fn from_5bit(values: &[u8]) -> Result<Vec<u8>, AddressErr> {
    let groups = values
        .iter()
        .map(|v| u5::try_from_u8(*v).map_err(|_| AddressErr::InvalidCharacter))
        .collect::<Result<Vec<u5>, _>>()?;
    Vec::<u8>::from_base32(&groups).map_err(|_| AddressErr::InvalidLength)
}

fn polymod(values: impl Iterator<Item = u8>) -> u64 {
    let mut c = 1u64;
    for d in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

fn checksum(prefix: &str, data: &[u8]) -> u64 {
    polymod(
        prefix
            .bytes()
            .map(|c| c & 0x1f)
            .chain(std::iter::once(0))
            .chain(data.iter().copied())
            .chain([0u8; CHECKSUM_LEN]),
    )
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.encode()).finish()
    }
}

impl FromStr for Address {
    type Err = AddressErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        String::serialize(&self.encode(), serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Address::decode(&string).map_err(|err| serde::de::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PrivateKey;

    #[test]
    fn mainnet_address_shape() {
        let key = PrivateKey::random().public_key().unwrap();
        let address = Address::from_public_key(&key, Network::Mainnet).encode();
        assert!(address.starts_with("kaspa:q"));
        assert_eq!(address.len(), "kaspa:".len() + 61);
        assert!(address["kaspa:".len()..]
            .bytes()
            .all(|c| CHARSET.contains(&c)));
    }

    #[test]
    fn testnet_address_shape() {
        let key = PrivateKey::random().public_key().unwrap();
        let address = Address::from_public_key(&key, Network::Testnet10).encode();
        assert!(address.starts_with("kaspatest:q"));
        assert_eq!(address.len(), "kaspatest:".len() + 61);
    }

    #[test]
    fn encode_decode_round_trip() {
        let key = PrivateKey::random().public_key().unwrap();
        for network in [Network::Mainnet, Network::Testnet10] {
            let address = Address::from_public_key(&key, network);
            let decoded = Address::decode(&address.encode()).unwrap();
            assert_eq!(decoded, address);
            assert_eq!(
                decoded.to_public_key_hex().unwrap()[2..],
                key.to_hex()[2..]
            );
        }
    }

    #[test]
    fn single_character_errors_are_detected() {
        let key = PrivateKey::random().public_key().unwrap();
        let address = Address::from_public_key(&key, Network::Mainnet).encode();
        let mut bytes = address.into_bytes();
        let i = bytes.len() - 12;
        bytes[i] = if bytes[i] == b'q' { b'p' } else { b'q' };
        let corrupted = String::from_utf8(bytes).unwrap();
        assert_eq!(
            Address::decode(&corrupted).unwrap_err(),
            AddressErr::InvalidChecksum
        );
    }

    #[test]
    fn prefix_is_part_of_the_checksum() {
        let key = PrivateKey::random().public_key().unwrap();
        let address = Address::from_public_key(&key, Network::Mainnet).encode();
        let swapped = address.replacen("kaspa:", "kaspatest:", 1);
        assert_eq!(
            Address::decode(&swapped).unwrap_err(),
            AddressErr::InvalidChecksum
        );
    }

    #[test]
    fn malformed_addresses() {
        assert_eq!(Address::decode("qqqq").unwrap_err(), AddressErr::MissingPrefix);
        assert_eq!(
            Address::decode("bitcoin:qqqqqqqqqqqq").unwrap_err(),
            AddressErr::InvalidPrefix
        );
        assert_eq!(
            Address::decode("kaspa:qqqqbqqqqqqq").unwrap_err(),
            AddressErr::InvalidCharacter
        );
        assert_eq!(Address::decode("kaspa:qq").unwrap_err(), AddressErr::InvalidLength);
    }

    #[test]
    fn serde_uses_the_encoded_form() {
        let key = PrivateKey::random().public_key().unwrap();
        let address = Address::from_public_key(&key, Network::Mainnet);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address.encode()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
