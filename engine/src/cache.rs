//! In-memory snapshot of reviews shared across screens.
//!
//! The cache is an ordinary value: whoever owns it decides when to load and
//! refresh it. Nothing in this crate holds one globally.

use crate::{ProductId, Review, ReviewId, UserId};
use std::collections::HashMap;

/// Snapshot of the reviews last read from the local store.
#[derive(Debug, Clone, Default)]
pub struct ReviewCache {
    reviews: Vec<Review>,
    by_id: HashMap<ReviewId, usize>,
    loaded: bool,
    generation: u64,
}

impl ReviewCache {
    /// Create an empty, unloaded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot. Bumps the generation counter.
    pub fn replace(&mut self, reviews: Vec<Review>) {
        self.by_id = reviews
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.review_id, idx))
            .collect();
        self.reviews = reviews;
        self.loaded = true;
        self.generation += 1;
    }

    /// Drop the snapshot; the next reader must reload it.
    pub fn invalidate(&mut self) {
        self.reviews.clear();
        self.by_id.clear();
        self.loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Incremented on every [`replace`](Self::replace).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, review_id: ReviewId) -> Option<&Review> {
        self.by_id.get(&review_id).map(|&idx| &self.reviews[idx])
    }

    pub fn all(&self) -> &[Review] {
        &self.reviews
    }

    pub fn for_product(&self, product_id: ProductId) -> impl Iterator<Item = &Review> {
        self.reviews.iter().filter(move |r| r.product_id == product_id)
    }

    pub fn for_user(&self, user_id: UserId) -> impl Iterator<Item = &Review> {
        self.reviews.iter().filter(move |r| r.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}
