// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::feed::Post;
use crate::indexer::{PaginationMetadata, PaginationOptions};
use std::collections::HashSet;

/// A scrolling list of posts with both pagination cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    posts: Vec<Post>,
    next_cursor: Option<String>,
    prev_cursor: Option<String>,
    has_more: bool,
}

impl Feed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    #[must_use]
    pub fn prev_cursor(&self) -> Option<&str> {
        self.prev_cursor.as_deref()
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn has_newer(&self) -> bool {
        self.prev_cursor.is_some()
    }

    /// Replaces everything with a first page.
    pub fn reset(&mut self, posts: Vec<Post>, pagination: PaginationMetadata) {
        self.posts = posts;
        self.next_cursor = pagination.next_cursor;
        self.prev_cursor = pagination.prev_cursor;
        self.has_more = pagination.has_more;
    }

    /// Options for the next older page, `None` when there is none.
    #[must_use]
    pub fn older_page(&self, limit: u32) -> Option<PaginationOptions> {
        if !self.has_more {
            return None;
        }

        let mut options = PaginationOptions::new().limit(limit);
        options.before = self.next_cursor.clone();
        Some(options)
    }

    /// Options for polling newer posts, `None` before the first page.
    #[must_use]
    pub fn newer_page(&self, limit: u32) -> Option<PaginationOptions> {
        self.prev_cursor
            .as_ref()
            .map(|cursor| PaginationOptions::new().limit(limit).after(cursor.clone()))
    }

    /// Appends an older page. Returns how many posts were new.
    pub fn append_older(&mut self, posts: Vec<Post>, pagination: PaginationMetadata) -> usize {
        let fresh = self.dedup(posts);
        let added = fresh.len();
        self.posts.extend(fresh);
        self.next_cursor = pagination.next_cursor;
        self.has_more = pagination.has_more;
        added
    }

    /// Prepends a newer page. An empty page leaves the cursors alone so
    /// polling can continue from the same point.
    pub fn prepend_newer(&mut self, posts: Vec<Post>, pagination: PaginationMetadata) -> usize {
        if posts.is_empty() {
            return 0;
        }

        let mut fresh = self.dedup(posts);
        let added = fresh.len();
        fresh.append(&mut self.posts);
        self.posts = fresh;
        if pagination.prev_cursor.is_some() {
            self.prev_cursor = pagination.prev_cursor;
        }
        added
    }

    /// Replaces posts in place with fresher copies, keyed by id.
    pub fn refresh(&mut self, posts: &[Post]) {
        for fresh in posts {
            if let Some(existing) = self.posts.iter_mut().find(|p| p.id == fresh.id) {
                *existing = fresh.clone();
            }
        }
    }

    fn dedup(&self, posts: Vec<Post>) -> Vec<Post> {
        let mut seen: HashSet<String> = self.posts.iter().map(|p| p.id.clone()).collect();
        posts
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect()
    }
}
