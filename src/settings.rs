// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::indexer::{DEFAULT_PAGE_LIMIT, DEFAULT_REQUEST_TIMEOUT};
use config::{Config, ConfigError, File};
use lazy_static::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, metadata, File as FsFile};
use std::io::Write;
use std::path::{Path, PathBuf};
use struct_field_names_as_array::FieldNamesAsArray;

pub const CONFIG_DIR_NAME: &str = "KTalk";
pub const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "ktalk";

lazy_static! {
    pub static ref SETTINGS: Settings = Settings::new().unwrap_or_else(|err| {
        error!("Invalid configuration, falling back to defaults: {err}");
        Settings::default()
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// Ledger network settings.
    pub network: Network,

    /// Indexer settings.
    pub indexer: Indexer,

    /// Local state settings.
    pub node: Node,
}

impl Settings {
    /// Loads settings from the user config directory, writing a default
    /// config file on first run.
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = default_config_path();
        if let Some(path) = &config_path {
            if metadata(path).is_err() {
                write_default_config(path);
            }
        }

        let env_source: Vec<_> = std::env::vars().collect();
        Self::load(config_path.as_deref(), &env_source)
    }

    /// Builds settings from defaults, an optional config file and the given
    /// environment, in increasing order of precedence.
    pub fn load(config_path: Option<&Path>, env_source: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut s = Config::builder();
        if let Some(path) = config_path {
            s = s.add_source(File::from(path.to_path_buf()).required(false));
        }

        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> =
            serde_yaml::from_value(
                serde_yaml::to_value(Settings::default())
                    .map_err(|err| ConfigError::Message(err.to_string()))?,
            )
            .map_err(|err| ConfigError::Message(err.to_string()))?;

        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), *v)?;
                    }

                    DynamicConfVal::U64(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), *v)?;
                    }

                    DynamicConfVal::Option(v) => {
                        if let Some(v) = v {
                            s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                        }
                    }
                }
            }
        }

        for (k, v) in overrides_from_env(env_source) {
            s = s.set_override(k, v)?;
        }

        s.build()?.try_deserialize()
    }
}

/// `<config_dir>/KTalk/config.toml`, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push(CONFIG_DIR_NAME);
    path.push(CONFIG_FILE_NAME);
    Some(path)
}

fn write_default_config(path: &Path) {
    let settings_str = match toml::ser::to_string_pretty(&Settings::default()) {
        Ok(s) => s,
        Err(err) => {
            error!("Failed to serialize default configuration! Reason: {err}");
            return;
        }
    };

    if let Some(parent) = path.parent() {
        if let Err(err) = create_dir_all(parent) {
            error!("Failed to create configuration directory! Reason: {err}");
            return;
        }
    }

    // Fall back to defaults and env vars if the file can't be written
    match FsFile::create(path) {
        Ok(mut file) => {
            file.write_all(settings_str.as_bytes()).unwrap_or(());
        }
        Err(err) => {
            error!("Failed to create configuration! Reason: {err}");
        }
    }
}

/// Maps `KTALK_<SECTION>_<FIELD>` variables to `section.field` keys. Field
/// names are matched with their underscores removed, so
/// `KTALK_INDEXER_APIURL` and `KTALK_INDEXER_API_URL` both work.
fn overrides_from_env(env_source: &[(String, String)]) -> Vec<(String, String)> {
    // Same order as the fields of `Settings`
    let settings_modules: [&[&str]; 3] = [
        &Network::FIELD_NAMES_AS_ARRAY[..],
        &Indexer::FIELD_NAMES_AS_ARRAY[..],
        &Node::FIELD_NAMES_AS_ARRAY[..],
    ];

    let possible_keys: HashMap<String, String> = Settings::FIELD_NAMES_AS_ARRAY
        .iter()
        .enumerate()
        .flat_map(|(i, section)| {
            settings_modules[i].iter().map(move |field| {
                (
                    format!("{}_{}_{}", ENV_PREFIX, section, field.replace('_', "")),
                    format!("{section}.{field}"),
                )
            })
        })
        .collect();

    env_source
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .filter_map(|(k, v)| {
            let key = k.to_lowercase();
            let section_and_field = key.splitn(3, '_').collect::<Vec<_>>();
            let normalized = match section_and_field.as_slice() {
                [prefix, section, field] => {
                    format!("{}_{}_{}", prefix, section, field.replace('_', ""))
                }
                _ => return None,
            };

            possible_keys
                .get(&normalized)
                .map(|target| (target.clone(), v.clone()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Network {
    /// `mainnet` or `testnet-10`.
    #[serde(alias = "networkname")]
    pub network_name: String,

    /// `resolver` picks a public node, `custom-node` uses `custom_node_url`.
    #[serde(alias = "connectiontype")]
    pub connection_type: String,

    /// Node RPC url used with `custom-node`.
    #[serde(alias = "customnodeurl")]
    pub custom_node_url: Option<String>,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            network_name: crate::primitives::Network::default().as_str().to_owned(),
            connection_type: "resolver".to_owned(),
            custom_node_url: None,
        }
    }
}

impl Network {
    pub fn network(&self) -> Result<crate::primitives::Network, ConfigError> {
        self.network_name
            .parse()
            .map_err(|_| ConfigError::Message(format!("unknown network: {}", self.network_name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Indexer {
    /// Base url of the indexer API.
    #[serde(alias = "apiurl")]
    pub api_url: String,

    /// Items requested per page.
    #[serde(alias = "pagesize")]
    pub page_size: u64,

    #[serde(alias = "requesttimeoutsecs")]
    pub request_timeout_secs: u64,
}

impl Default for Indexer {
    fn default() -> Self {
        Self {
            api_url: "https://indexer.kaspatalk.net".to_owned(),
            page_size: u64::from(DEFAULT_PAGE_LIMIT),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Node {
    /// Directory for local state such as the notification cursor.
    #[serde(alias = "datadir")]
    pub data_dir: String,
}

impl Default for Node {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|mut p| {
                p.push(CONFIG_DIR_NAME);
                p
            })
            .unwrap_or_else(|| PathBuf::from(".ktalk"));

        Self {
            data_dir: path.to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Option(Option<String>),
    Bool(bool),
    U64(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let settings = Settings::load(None, &[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.network.network_name, "testnet-10");
        assert_eq!(settings.indexer.page_size, 10);
        assert_eq!(settings.indexer.request_timeout_secs, 10);
    }

    #[test]
    fn env_overrides_defaults() {
        let env = env(&[
            ("KTALK_NETWORK_NETWORK_NAME", "mainnet"),
            ("KTALK_INDEXER_APIURL", "http://127.0.0.1:3000"),
            ("KTALK_INDEXER_PAGESIZE", "25"),
            ("KTALK_INDEXER_UNKNOWN", "x"),
            ("KTALK_NETWORK_CUSTOMNODEURL", ""),
            ("PATH", "/usr/bin"),
        ]);
        let settings = Settings::load(None, &env).unwrap();
        assert_eq!(settings.network.network().unwrap(), crate::primitives::Network::Mainnet);
        assert_eq!(settings.indexer.api_url, "http://127.0.0.1:3000");
        assert_eq!(settings.indexer.page_size, 25);
        assert_eq!(settings.network.custom_node_url, None);
    }

    #[test]
    fn file_is_read_and_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[network]\nnetwork_name = \"mainnet\"\nconnection_type = \"custom-node\"\ncustom_node_url = \"ws://node:17110\"\n\n[indexer]\npage_size = 50\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path), &env(&[("KTALK_INDEXER_PAGE_SIZE", "5")])).unwrap();
        assert_eq!(settings.network.connection_type, "custom-node");
        assert_eq!(settings.network.custom_node_url.as_deref(), Some("ws://node:17110"));
        assert_eq!(settings.indexer.page_size, 5);
        assert_eq!(settings.indexer.api_url, Indexer::default().api_url);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        write_default_config(&path);
        assert!(path.exists());
        assert_eq!(Settings::load(Some(&path), &[]).unwrap(), Settings::default());
    }

    #[test]
    fn unknown_network_is_rejected() {
        let settings = Settings::load(None, &env(&[("KTALK_NETWORK_NETWORKNAME", "devnet")])).unwrap();
        assert!(settings.network.network().is_err());
    }

    #[test]
    #[serial]
    fn process_env_is_picked_up() {
        std::env::set_var("KTALK_INDEXER_REQUESTTIMEOUTSECS", "3");
        let env_source: Vec<_> = std::env::vars().collect();
        let settings = Settings::load(None, &env_source);
        std::env::remove_var("KTALK_INDEXER_REQUESTTIMEOUTSECS");
        assert_eq!(settings.unwrap().indexer.request_timeout_secs, 3);
    }
}
