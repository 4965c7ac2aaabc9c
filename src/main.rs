// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use kprotocol::codec::*;
use kprotocol::feed::*;
use kprotocol::indexer::*;
use kprotocol::primitives::*;
use kprotocol::settings::SETTINGS;
use log::*;
use mimalloc::MiMalloc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder;
use tracing_subscriber::prelude::*;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "ktalk", version, about = "K-protocol command line client")]
struct Cli {
    /// Overrides the configured network (`mainnet` or `testnet-10`).
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Overrides the configured indexer url.
    #[arg(long, global = true)]
    indexer: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an action and print its wire payload.
    Encode {
        /// Hex encoded private key.
        #[arg(long)]
        key: String,

        #[command(subcommand)]
        action: ActionCmd,
    },

    /// Classify a wire payload and print the record as JSON.
    Decode {
        payload: String,

        /// Transaction id to attach to the record.
        #[arg(long, default_value = "")]
        id: String,

        /// Block time in milliseconds.
        #[arg(long, default_value_t = 0)]
        timestamp: i64,

        /// Also check the signature.
        #[arg(long)]
        verify: bool,
    },

    /// Print the address of a public key.
    Address { pubkey: String },

    /// Fetch a page of posts from the indexer.
    Feed {
        #[arg(value_enum)]
        kind: FeedKind,

        /// Viewing identity.
        #[arg(long)]
        requester: String,

        /// Profile owner for `user` and `mentions`, post id for `replies`.
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        before: Option<String>,

        /// Print raw JSON instead of one line per post.
        #[arg(long)]
        json: bool,
    },

    /// Check that the indexer serves the selected network.
    Health,

    /// Fetch the number of unread notifications.
    Notifications {
        #[arg(long)]
        requester: String,

        /// Mark everything up to this cursor as seen first.
        #[arg(long)]
        mark_seen: Option<String>,
    },
}

#[derive(Subcommand)]
enum ActionCmd {
    Post {
        message: String,
        #[arg(long = "mention")]
        mentions: Vec<String>,
    },
    Reply {
        post_id: String,
        message: String,
        #[arg(long = "mention")]
        mentions: Vec<String>,
    },
    Broadcast {
        nickname: String,
        message: String,
        #[arg(long)]
        profile_image: Option<String>,
    },
    Vote {
        post_id: String,
        vote: VoteKind,
        author: String,
    },
    Block {
        action: BlockingAction,
        pubkey: String,
    },
    Follow {
        action: FollowingAction,
        pubkey: String,
    },
    Quote {
        post_id: String,
        message: String,
        author: String,
    },
}

impl From<ActionCmd> for Action {
    fn from(cmd: ActionCmd) -> Self {
        match cmd {
            ActionCmd::Post { message, mentions } => Action::post(message, mentions),
            ActionCmd::Reply {
                post_id,
                message,
                mentions,
            } => Action::reply(post_id, message, mentions),
            ActionCmd::Broadcast {
                nickname,
                message,
                profile_image,
            } => Action::broadcast(nickname, profile_image, message),
            ActionCmd::Vote {
                post_id,
                vote,
                author,
            } => Action::vote(post_id, vote, author),
            ActionCmd::Block { action, pubkey } => Action::block(action, pubkey),
            ActionCmd::Follow { action, pubkey } => Action::follow(action, pubkey),
            ActionCmd::Quote {
                post_id,
                message,
                author,
            } => Action::quote(post_id, message, author),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedKind {
    Following,
    Watching,
    User,
    Mentions,
    Replies,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let network = match cli.network {
        Some(network) => network,
        None => SETTINGS.network.network()?,
    };

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cli.cmd, network, cli.indexer))
}

async fn run(cmd: Commands, network: Network, indexer: Option<String>) -> anyhow::Result<()> {
    match cmd {
        Commands::Encode { key, action } => {
            let key = PrivateKey::from_hex(&key).map_err(|err| anyhow!("{err}"))?;
            let action: Action = action.into();
            let signed = encode_action(&action, &key).map_err(|err| anyhow!("{err}"))?;
            debug!("Signed {} action: {}", action.kind(), signed.signing_string);
            println!("{}", signed.payload.as_str());
        }

        Commands::Decode {
            payload,
            id,
            timestamp,
            verify,
        } => {
            let record = DecodedRecord::classify(payload.trim(), id, timestamp)
                .ok_or_else(|| anyhow!("not a K-protocol payload"))?;
            if verify {
                record.verify().map_err(|err| anyhow!("{err}"))?;
                info!("Signature is valid");
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Address { pubkey } => {
            let address =
                Address::from_public_key_hex(&pubkey, network).map_err(|err| anyhow!("{err}"))?;
            println!("{}", address.encode());
        }

        Commands::Feed {
            kind,
            requester,
            target,
            limit,
            before,
            json,
        } => {
            let client = checked_indexer_client(indexer.as_deref(), network).await?;
            let mut options = PaginationOptions::new().limit(
                limit.unwrap_or_else(|| {
                    u32::try_from(SETTINGS.indexer.page_size).unwrap_or(DEFAULT_PAGE_LIMIT)
                }),
            );
            options.before = before;

            let ctx = ViewContext::new(Some(requester.clone()), network);
            let require_target = || target.clone().context("--target is required for this feed");
            let (posts, pagination) = match kind {
                FeedKind::Following => {
                    let page = client.fetch_following_posts(&requester, &options).await?;
                    (posts_from_server(&page.posts, &ctx), page.pagination)
                }
                FeedKind::Watching => {
                    let page = client.fetch_watching_posts(&requester, &options).await?;
                    (posts_from_server(&page.posts, &ctx), page.pagination)
                }
                FeedKind::User => {
                    let page = client
                        .fetch_user_posts(&require_target()?, &requester, &options)
                        .await?;
                    (posts_from_server(&page.posts, &ctx), page.pagination)
                }
                FeedKind::Mentions => {
                    let page = client
                        .fetch_mentions(&require_target()?, &requester, &options)
                        .await?;
                    (posts_from_server(&page.posts, &ctx), page.pagination)
                }
                FeedKind::Replies => {
                    let page = client
                        .fetch_post_replies(&require_target()?, &requester, &options)
                        .await?;
                    (posts_from_server_replies(&page.replies, &ctx), page.pagination)
                }
            };

            let mut feed = Feed::new();
            feed.reset(posts, pagination);
            print_feed(&feed, json)?;
        }

        Commands::Health => {
            let client = indexer_client(indexer.as_deref())?;
            let health = client.validate_network(network).await?;
            println!(
                "{} serves {} ({})",
                client.base(),
                health.network,
                health.status.as_deref().unwrap_or("ok")
            );
        }

        Commands::Notifications {
            requester,
            mark_seen,
        } => {
            let client = checked_indexer_client(indexer.as_deref(), network).await?;
            let path = PathBuf::from(&SETTINGS.node.data_dir).join(NOTIFICATION_CURSOR_FILE);
            let mut tracker = NotificationTracker::load(path);
            if let Some(cursor) = mark_seen {
                tracker.mark_all_seen(&cursor)?;
            }
            let count = tracker.refresh(&client, &requester).await?;
            println!("{count}");
        }
    }

    Ok(())
}

fn indexer_client(url: Option<&str>) -> anyhow::Result<IndexerClient> {
    let url = url.unwrap_or(&SETTINGS.indexer.api_url);
    let timeout = Duration::from_secs(SETTINGS.indexer.request_timeout_secs);
    Ok(IndexerClient::new(url, timeout)?)
}

/// Refuses an indexer on another network. An unreachable health endpoint
/// only warns, the actual query reports its own error.
async fn checked_indexer_client(url: Option<&str>, network: Network) -> anyhow::Result<IndexerClient> {
    let client = indexer_client(url)?;
    match client.validate_network(network).await {
        Ok(_) => {}
        Err(err @ IndexerErr::NetworkMismatch { .. }) => {
            return Err(anyhow!("{err}. Update the indexer url to match the selected network"));
        }
        Err(err) => warn!("Could not validate indexer network: {err}"),
    }
    Ok(client)
}

fn print_feed(feed: &Feed, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(feed.posts())?);
        return Ok(());
    }

    for post in feed.posts() {
        println!(
            "[{}] {} ({}): {} [+{} -{} replies {}]",
            post.timestamp,
            post.author.name,
            post.id,
            post.content,
            post.up_votes,
            post.down_votes,
            post.replies
        );
    }

    if let Some(cursor) = feed.next_cursor().filter(|_| feed.has_more()) {
        println!("-- more: --before {cursor}");
    }

    Ok(())
}

/// Installs a stderr subscriber filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
