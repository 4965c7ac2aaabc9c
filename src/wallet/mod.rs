// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Submission of signed actions as ledger transaction payloads.
//!
//! The ledger itself is reached through an injected [`LedgerClient`]. A
//! submission opens the client, fetches spendable outputs, signs, submits
//! exactly once and closes the client again on every path.

use crate::codec::{encode_action, Action, EncodeErr, ValidationErr};
use crate::primitives::{sompi_to_kas_string, Address, Network, PrivateKey, SignatureErr};
use async_trait::async_trait;
use log::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErr {
    /// Could not open the connection.
    Connect(String),

    /// The node answered with an error.
    Rpc(String),

    /// The transaction was rejected.
    Rejected(String),
}

impl fmt::Display for TransportErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(reason) => write!(f, "connection failed: {reason}"),
            Self::Rpc(reason) => write!(f, "rpc error: {reason}"),
            Self::Rejected(reason) => write!(f, "transaction rejected: {reason}"),
        }
    }
}

impl std::error::Error for TransportErr {}

/// What the user has to do about a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    NoFunds,
    Network,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitErr {
    Validation(ValidationErr),
    Signature(SignatureErr),

    /// No spendable outputs for the sender address.
    NoUtxos,

    Transport(TransportErr),

    /// Another submission for the same key has not finished yet.
    InFlight,
}

impl SubmitErr {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::Signature(_) => FailureKind::InvalidInput,
            Self::NoUtxos => FailureKind::NoFunds,
            Self::Transport(_) => FailureKind::Network,
            Self::InFlight => FailureKind::Busy,
        }
    }

    /// Message shown to the user. Each failure kind maps to a different
    /// required response.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => format!("Invalid input: {err}. Please fix it and try again."),
            Self::Signature(err) => format!("Invalid input: {err}. Check your private key."),
            Self::NoUtxos => {
                "No UTXOs found. Fill up your account with some KAS and try again.".to_owned()
            }
            Self::Transport(err) => {
                format!("Network or submission failure: {err}. Please retry later.")
            }
            Self::InFlight => {
                "Another action is still being submitted. Wait for it to finish.".to_owned()
            }
        }
    }
}

impl fmt::Display for SubmitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation error: {err}"),
            Self::Signature(err) => write!(f, "signature error: {err}"),
            Self::NoUtxos => write!(f, "no UTXOs"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::InFlight => write!(f, "submission already in flight"),
        }
    }
}

impl std::error::Error for SubmitErr {}

impl From<ValidationErr> for SubmitErr {
    fn from(err: ValidationErr) -> Self {
        Self::Validation(err)
    }
}

impl From<TransportErr> for SubmitErr {
    fn from(err: TransportErr) -> Self {
        Self::Transport(err)
    }
}

impl From<EncodeErr> for SubmitErr {
    fn from(err: EncodeErr) -> Self {
        match err {
            EncodeErr::Validation(err) => Self::Validation(err),
            EncodeErr::Signature(err) => Self::Signature(err),
        }
    }
}

/// Unspent output as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub transaction_id: String,
    pub index: u32,

    /// Amount in sompi.
    pub amount: u64,
    pub script_public_key: String,
    pub block_daa_score: u64,
    pub is_coinbase: bool,
}

/// Everything the ledger client needs to build, sign and submit one
/// transaction carrying a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub network: Network,
    pub entries: Vec<UtxoEntry>,
    pub change_address: Address,

    /// UTF-8 wire payload bytes.
    pub payload: Vec<u8>,

    /// Priority fee in sompi.
    pub priority_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub id: String,

    /// Fee in sompi.
    pub fee_amount: u64,
}

/// What a successful submission reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub id: String,
    pub fee_amount: u64,
    pub fee_kas: String,
}

/// Connection to a ledger node. Implementations own their socket; callers
/// open it for one UTXO fetch and one submission.
#[async_trait]
pub trait LedgerClient: Send {
    async fn connect(&mut self) -> Result<(), TransportErr>;

    async fn disconnect(&mut self) -> Result<(), TransportErr>;

    async fn get_utxos_by_address(&mut self, address: &Address)
        -> Result<Vec<UtxoEntry>, TransportErr>;

    async fn submit_transaction(
        &mut self,
        request: TransactionRequest,
        key: &PrivateKey,
    ) -> Result<SubmittedTransaction, TransportErr>;
}

/// Validates, signs and submits an action. Once a connection is attempted
/// the client is disconnected on every exit path, including a failed
/// connect. Nothing is retried.
#[tracing::instrument(skip_all, fields(action = %action.kind(), network = %network))]
pub async fn submit_action<C: LedgerClient + ?Sized>(
    client: &mut C,
    key: &PrivateKey,
    action: &Action,
    network: Network,
) -> Result<TransactionResult, SubmitErr> {
    action.validate()?;
    let public_key = key.public_key()?;
    let address = Address::from_public_key(&public_key, network);

    let result = match client.connect().await {
        Ok(()) => submit_connected(client, key, action, network, address).await,
        Err(err) => Err(err.into()),
    };

    if let Err(err) = client.disconnect().await {
        warn!("Failed to close ledger connection: {err}");
    }

    result
}

async fn submit_connected<C: LedgerClient + ?Sized>(
    client: &mut C,
    key: &PrivateKey,
    action: &Action,
    network: Network,
    address: Address,
) -> Result<TransactionResult, SubmitErr> {
    let entries = client.get_utxos_by_address(&address).await?;

    // Single entry happy path. Selection policy belongs to the wallet.
    let Some(selected) = entries.into_iter().next() else {
        return Err(SubmitErr::NoUtxos);
    };

    let signed = encode_action(action, key)?;
    debug!("Submitting {} payload: {}", action.kind(), signed.payload);

    let request = TransactionRequest {
        network,
        entries: vec![selected],
        change_address: address,
        payload: signed.payload.into_string().into_bytes(),
        priority_fee: 0,
    };

    let submitted = client.submit_transaction(request, key).await?;
    info!(
        "Submitted {} transaction {} with fee {} sompi",
        action.kind(),
        submitted.id,
        submitted.fee_amount
    );

    Ok(TransactionResult {
        fee_kas: sompi_to_kas_string(submitted.fee_amount),
        id: submitted.id,
        fee_amount: submitted.fee_amount,
    })
}

/// Submits actions while making sure at most one submission per identity is
/// in flight. A second concurrent submission for the same key is rejected,
/// not queued.
#[derive(Debug, Clone, Default)]
pub struct Submitter {
    network: Network,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Submitter {
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Marks `public_key` busy until the guard is dropped. `None` if it
    /// already is.
    #[must_use]
    pub fn reserve(&self, public_key: &str) -> Option<InFlightGuard> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(public_key.to_owned()) {
            return None;
        }

        Some(InFlightGuard {
            in_flight: self.in_flight.clone(),
            public_key: public_key.to_owned(),
        })
    }

    #[must_use]
    pub fn is_in_flight(&self, public_key: &str) -> bool {
        self.in_flight.lock().contains(public_key)
    }

    pub async fn submit<C: LedgerClient + ?Sized>(
        &self,
        client: &mut C,
        key: &PrivateKey,
        action: &Action,
    ) -> Result<TransactionResult, SubmitErr> {
        action.validate()?;
        let public_key = key.public_key()?.to_hex();
        let _guard = self.reserve(&public_key).ok_or(SubmitErr::InFlight)?;
        submit_action(client, key, action, self.network).await
    }
}

/// Releases the reservation on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    public_key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.public_key);
    }
}
