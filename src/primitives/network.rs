// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Network {
    #[serde(rename = "mainnet")]
    Mainnet,

    #[default]
    #[serde(rename = "testnet-10")]
    Testnet10,
}

impl Network {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet10 => "testnet-10",
        }
    }

    /// Human readable part of addresses on this network.
    #[must_use]
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "kaspa",
            Self::Testnet10 => "kaspatest",
        }
    }

    #[must_use]
    pub fn explorer_base_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://kaspa.stream",
            Self::Testnet10 => "https://tn10.kaspa.stream",
        }
    }

    #[must_use]
    pub fn explorer_transaction_url(&self, transaction_id: &str) -> String {
        format!("{}/transactions/{}", self.explorer_base_url(), transaction_id)
    }

    #[must_use]
    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/addresses/{}", self.explorer_base_url(), address)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "testnet-10" => Ok(Self::Testnet10),
            _ => Err("invalid network name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("testnet-10".parse::<Network>().unwrap(), Network::Testnet10);
        assert!("devnet".parse::<Network>().is_err());
        assert_eq!(Network::Testnet10.to_string(), "testnet-10");
    }

    #[test]
    fn explorer_urls() {
        assert_eq!(
            Network::Mainnet.explorer_transaction_url("abc"),
            "https://kaspa.stream/transactions/abc"
        );
        assert_eq!(
            Network::Testnet10.explorer_address_url("kaspatest:qq"),
            "https://tn10.kaspa.stream/addresses/kaspatest:qq"
        );
    }
}
