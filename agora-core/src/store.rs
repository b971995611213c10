//! The entity store: typed, in-memory keyed records.
//!
//! Every method is one atomic step. Callers composing multi-step sequences
//! (notably post submission) commit step by step, not under one cross-step
//! transaction.
//!
//! The store also owns the insertion sequence counter. Posts and users
//! carry their sequence number so orderings stay deterministic when epoch
//! timestamps collide.

use crate::fame::{Fame, FameLadder, FameLevel};
use crate::model::{
    AreaId, ExpertiseArea, Post, PostClassification, PostId, Timestamp, User, UserId, UserRating,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors from store lookups.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    #[error("post {0} does not exist")]
    PostNotFound(PostId),

    #[error("expertise area {0} does not exist")]
    AreaNotFound(AreaId),
}

/// In-memory entity store for the social graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, Post>,
    areas: HashMap<AreaId, ExpertiseArea>,
    fame: HashMap<UserId, HashMap<AreaId, Fame>>,
    ratings: Vec<UserRating>,
    ladder: FameLadder,
    next_seq: u64,
}

impl EntityStore {
    /// Create an empty store with the standard fame ladder.
    pub fn new() -> Self {
        Self::with_ladder(FameLadder::standard())
    }

    /// Create an empty store with a custom fame ladder.
    pub fn with_ladder(ladder: FameLadder) -> Self {
        Self {
            users: HashMap::new(),
            posts: HashMap::new(),
            areas: HashMap::new(),
            fame: HashMap::new(),
            ratings: Vec::new(),
            ladder,
            next_seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn create_user(
        &mut self,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> UserId {
        self.create_user_at(email, first_name, last_name, Timestamp::now())
    }

    /// Create a user with an explicit join timestamp.
    pub fn create_user_at(
        &mut self,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        joined_at: Timestamp,
    ) -> UserId {
        let id = UserId::new();
        let joined_seq = self.next_seq();
        self.users.insert(
            id,
            User {
                id,
                email: email.into(),
                first_name: first_name.into(),
                last_name: last_name.into(),
                active: true,
                logout_required: false,
                joined_at,
                joined_seq,
                follows: HashSet::new(),
                communities: HashSet::new(),
            },
        );
        id
    }

    pub fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or(StoreError::UserNotFound(id))
    }

    pub(crate) fn user_mut(&mut self, id: UserId) -> Result<&mut User, StoreError> {
        self.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Add `target` to `user`'s follow set. Returns false if already followed.
    pub fn add_follow(&mut self, user: UserId, target: UserId) -> Result<bool, StoreError> {
        self.user(target)?;
        Ok(self.user_mut(user)?.follows.insert(target))
    }

    /// Remove `target` from `user`'s follow set. Returns false if not followed.
    pub fn remove_follow(&mut self, user: UserId, target: UserId) -> Result<bool, StoreError> {
        self.user(target)?;
        Ok(self.user_mut(user)?.follows.remove(&target))
    }

    /// Add `area` to `user`'s communities. Returns false if already a member.
    pub fn join_community(&mut self, user: UserId, area: AreaId) -> Result<bool, StoreError> {
        self.area(area)?;
        Ok(self.user_mut(user)?.communities.insert(area))
    }

    /// Remove `area` from `user`'s communities. Returns false if not a member.
    pub fn leave_community(&mut self, user: UserId, area: AreaId) -> Result<bool, StoreError> {
        Ok(self.user_mut(user)?.communities.remove(&area))
    }

    // ========================================================================
    // Expertise areas
    // ========================================================================

    /// Look up an area by label, creating it on first use.
    pub fn get_or_create_area(&mut self, label: &str) -> AreaId {
        if let Some(area) = self.area_by_label(label) {
            return area.id;
        }
        let id = AreaId::new();
        self.areas.insert(
            id,
            ExpertiseArea {
                id,
                label: label.to_string(),
            },
        );
        id
    }

    pub fn area(&self, id: AreaId) -> Result<&ExpertiseArea, StoreError> {
        self.areas.get(&id).ok_or(StoreError::AreaNotFound(id))
    }

    pub fn area_by_label(&self, label: &str) -> Option<&ExpertiseArea> {
        self.areas.values().find(|a| a.label == label)
    }

    pub fn areas(&self) -> impl Iterator<Item = &ExpertiseArea> {
        self.areas.values()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Persist a new, initially unpublished post.
    pub fn create_post(
        &mut self,
        author: UserId,
        content: impl Into<String>,
        cites: Option<PostId>,
        replies_to: Option<PostId>,
        submitted_at: Timestamp,
    ) -> Result<PostId, StoreError> {
        self.user(author)?;
        let id = PostId::new();
        let seq = self.next_seq();
        self.posts.insert(
            id,
            Post {
                id,
                author,
                content: content.into(),
                published: false,
                submitted_at,
                seq,
                cites,
                replies_to,
                classifications: Vec::new(),
            },
        );
        Ok(id)
    }

    pub fn post(&self, id: PostId) -> Result<&Post, StoreError> {
        self.posts.get(&id).ok_or(StoreError::PostNotFound(id))
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn set_post_published(&mut self, id: PostId, published: bool) -> Result<(), StoreError> {
        let post = self.posts.get_mut(&id).ok_or(StoreError::PostNotFound(id))?;
        post.published = published;
        Ok(())
    }

    pub fn set_post_classifications(
        &mut self,
        id: PostId,
        classifications: Vec<PostClassification>,
    ) -> Result<(), StoreError> {
        let post = self.posts.get_mut(&id).ok_or(StoreError::PostNotFound(id))?;
        post.classifications = classifications;
        Ok(())
    }

    /// Unpublish every post by `author`. Returns how many were flipped.
    pub fn unpublish_all_by(&mut self, author: UserId) -> usize {
        let mut flipped = 0;
        for post in self.posts.values_mut() {
            if post.author == author && post.published {
                post.published = false;
                flipped += 1;
            }
        }
        flipped
    }

    // ========================================================================
    // Fame
    // ========================================================================

    pub fn fame(&self, user: UserId, area: AreaId) -> Option<&Fame> {
        self.fame.get(&user).and_then(|areas| areas.get(&area))
    }

    /// All fame records for one user, ordered by area label.
    pub fn fame_of(&self, user: UserId) -> Vec<&Fame> {
        let mut records: Vec<&Fame> = self
            .fame
            .get(&user)
            .map(|areas| areas.values().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| {
            let left = self.areas.get(&a.area).map(|ar| ar.label.as_str());
            let right = self.areas.get(&b.area).map(|ar| ar.label.as_str());
            left.cmp(&right)
        });
        records
    }

    pub fn fame_records(&self) -> impl Iterator<Item = &Fame> {
        self.fame.values().flat_map(|areas| areas.values())
    }

    /// Insert or overwrite the fame record for (user, area).
    pub fn set_fame(&mut self, user: UserId, area: AreaId, level: FameLevel) {
        self.fame
            .entry(user)
            .or_default()
            .insert(area, Fame { user, area, level });
    }

    pub fn ladder(&self) -> &FameLadder {
        &self.ladder
    }

    pub fn ladder_mut(&mut self) -> &mut FameLadder {
        &mut self.ladder
    }

    // ========================================================================
    // Ratings
    // ========================================================================

    /// Insert or update the rating for (rater, post, rating type).
    ///
    /// Returns true when a new record was created, false on update-in-place.
    pub fn upsert_rating(
        &mut self,
        rater: UserId,
        post: PostId,
        rating_type: &str,
        rating_score: i32,
    ) -> bool {
        if let Some(existing) = self
            .ratings
            .iter_mut()
            .find(|r| r.rater == rater && r.post == post && r.rating_type == rating_type)
        {
            existing.rating_score = rating_score;
            return false;
        }
        self.ratings.push(UserRating {
            rater,
            post,
            rating_type: rating_type.to_string(),
            rating_score,
        });
        true
    }

    pub fn ratings(&self) -> &[UserRating] {
        &self.ratings
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
