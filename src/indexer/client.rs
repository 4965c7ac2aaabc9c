// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::indexer::*;
use crate::primitives::Network;
use futures::future::join_all;
use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexerErr {
    /// Request could not be sent or the body could not be read.
    Http(String),

    /// Non 2xx answer with the body text.
    Status(u16, String),

    /// The indexer serves another network than the selected one.
    NetworkMismatch { indexer: String, selected: Network },
}

impl fmt::Display for IndexerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(reason) => write!(f, "indexer request failed: {reason}"),
            Self::Status(code, body) => write!(f, "indexer returned {code}: {body}"),
            Self::NetworkMismatch { indexer, selected } => write!(
                f,
                "indexer is running on \"{indexer}\" but \"{selected}\" is selected"
            ),
        }
    }
}

impl std::error::Error for IndexerErr {}

impl From<reqwest::Error> for IndexerErr {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// One indexer request. Each variant knows its path and its fixed query
/// parameters; pagination is appended for the paginated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerQuery<'a> {
    UserPosts { user: &'a str, requester: &'a str },
    FollowingPosts { requester: &'a str },
    WatchingPosts { requester: &'a str },
    Mentions { user: &'a str, requester: &'a str },
    Users,
    PostDetails { id: &'a str, requester: &'a str },
    UserDetails { user: &'a str, requester: &'a str },
    PostReplies { post: &'a str, requester: &'a str },
    UserReplies { user: &'a str, requester: &'a str },
    Notifications { requester: &'a str },
    NotificationsCount { requester: &'a str, after: Option<&'a str> },
    Health,
}

impl<'a> IndexerQuery<'a> {
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::UserPosts { .. } => "get-posts",
            Self::FollowingPosts { .. } => "get-posts-following",
            Self::WatchingPosts { .. } => "get-posts-watching",
            Self::Mentions { .. } => "get-mentions",
            Self::Users => "get-users",
            Self::PostDetails { .. } => "get-post-details",
            Self::UserDetails { .. } => "get-user-details",
            Self::PostReplies { .. } | Self::UserReplies { .. } => "get-replies",
            Self::Notifications { .. } => "get-notifications",
            Self::NotificationsCount { .. } => "get-notifications-count",
            Self::Health => "health",
        }
    }

    #[must_use]
    pub fn is_paginated(&self) -> bool {
        !matches!(
            self,
            Self::PostDetails { .. }
                | Self::UserDetails { .. }
                | Self::NotificationsCount { .. }
                | Self::Health
        )
    }

    #[must_use]
    pub fn params(&self, options: &PaginationOptions) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = match *self {
            Self::UserPosts { user, requester }
            | Self::Mentions { user, requester }
            | Self::UserReplies { user, requester }
            | Self::UserDetails { user, requester } => vec![
                ("user", user.to_owned()),
                ("requesterPubkey", requester.to_owned()),
            ],
            Self::FollowingPosts { requester }
            | Self::WatchingPosts { requester }
            | Self::Notifications { requester } => {
                vec![("requesterPubkey", requester.to_owned())]
            }
            Self::Users | Self::Health => vec![],
            Self::PostDetails { id, requester } => vec![
                ("id", id.to_owned()),
                ("requesterPubkey", requester.to_owned()),
            ],
            Self::PostReplies { post, requester } => vec![
                ("post", post.to_owned()),
                ("requesterPubkey", requester.to_owned()),
            ],
            Self::NotificationsCount { requester, after } => {
                let mut params = vec![("requesterPubkey", requester.to_owned())];
                if let Some(after) = after.filter(|c| !c.is_empty()) {
                    params.push(("after", after.to_owned()));
                }
                params
            }
        };

        if self.is_paginated() {
            params.extend(options.query_pairs());
        }

        params
    }
}

/// HTTP client for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    base: String,
    client: Client,
}

impl IndexerClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, IndexerErr> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: normalize_api_url(base),
            client,
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn url_for(&self, query: &IndexerQuery<'_>) -> String {
        format!("{}/{}", self.base, query.path())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        query: IndexerQuery<'_>,
        options: &PaginationOptions,
    ) -> Result<T, IndexerErr> {
        let url = self.url_for(&query);
        let params = query.params(options);
        debug!("GET {url} {params:?}");

        let resp = self.client.get(&url).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexerErr::Status(status.as_u16(), body));
        }

        Ok(resp.json::<T>().await?)
    }

    pub async fn fetch_user_posts(
        &self,
        user: &str,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<PostsPage, IndexerErr> {
        self.get(IndexerQuery::UserPosts { user, requester }, options)
            .await
    }

    pub async fn fetch_following_posts(
        &self,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<PostsPage, IndexerErr> {
        self.get(IndexerQuery::FollowingPosts { requester }, options)
            .await
    }

    pub async fn fetch_watching_posts(
        &self,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<PostsPage, IndexerErr> {
        self.get(IndexerQuery::WatchingPosts { requester }, options)
            .await
    }

    pub async fn fetch_mentions(
        &self,
        user: &str,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<PostsPage, IndexerErr> {
        self.get(IndexerQuery::Mentions { user, requester }, options)
            .await
    }

    pub async fn fetch_users(&self, options: &PaginationOptions) -> Result<UsersPage, IndexerErr> {
        self.get(IndexerQuery::Users, options).await
    }

    pub async fn fetch_post_details(
        &self,
        id: &str,
        requester: &str,
    ) -> Result<PostDetails, IndexerErr> {
        self.get(
            IndexerQuery::PostDetails { id, requester },
            &PaginationOptions::default(),
        )
        .await
    }

    pub async fn fetch_user_details(
        &self,
        user: &str,
        requester: &str,
    ) -> Result<ServerUserDetails, IndexerErr> {
        self.get(
            IndexerQuery::UserDetails { user, requester },
            &PaginationOptions::default(),
        )
        .await
    }

    /// Details for several users at once, in the order given. Each lookup
    /// fails independently.
    pub async fn fetch_users_details(
        &self,
        users: &[&str],
        requester: &str,
    ) -> Vec<Result<ServerUserDetails, IndexerErr>> {
        join_all(
            users
                .iter()
                .map(|user| self.fetch_user_details(user, requester)),
        )
        .await
    }

    pub async fn fetch_post_replies(
        &self,
        post: &str,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<RepliesPage, IndexerErr> {
        self.get(IndexerQuery::PostReplies { post, requester }, options)
            .await
    }

    pub async fn fetch_user_replies(
        &self,
        user: &str,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<RepliesPage, IndexerErr> {
        self.get(IndexerQuery::UserReplies { user, requester }, options)
            .await
    }

    pub async fn fetch_notifications(
        &self,
        requester: &str,
        options: &PaginationOptions,
    ) -> Result<NotificationsPage, IndexerErr> {
        self.get(IndexerQuery::Notifications { requester }, options)
            .await
    }

    /// Number of notifications newer than `after`.
    pub async fn fetch_notifications_count(
        &self,
        requester: &str,
        after: Option<&str>,
    ) -> Result<u64, IndexerErr> {
        let count: NotificationCount = self
            .get(
                IndexerQuery::NotificationsCount { requester, after },
                &PaginationOptions::default(),
            )
            .await?;
        Ok(count.count)
    }

    pub async fn health_check(&self) -> Result<HealthStatus, IndexerErr> {
        self.get(IndexerQuery::Health, &PaginationOptions::default())
            .await
    }

    /// Fails with `NetworkMismatch` when the indexer serves another network.
    pub async fn validate_network(&self, selected: Network) -> Result<HealthStatus, IndexerErr> {
        let health = self.health_check().await?;
        health.ensure_network(selected)?;
        Ok(health)
    }
}

impl HealthStatus {
    pub fn ensure_network(&self, selected: Network) -> Result<(), IndexerErr> {
        if self.network == selected.as_str() {
            Ok(())
        } else {
            Err(IndexerErr::NetworkMismatch {
                indexer: self.network.clone(),
                selected,
            })
        }
    }
}
