//! Social graph entity types.
//!
//! Contains the record types the entity store holds: users, posts,
//! expertise areas, and per-post ratings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use veracity::TruthRating;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for expertise areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaId(pub Uuid);

impl AreaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AreaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Time
// ============================================================================

/// Seconds since the Unix epoch.
///
/// Equal timestamps are possible at second granularity; orderings that need
/// full determinism break ties with the store's insertion sequence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Users
// ============================================================================

/// A registered user of the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// False once the user has been banned.
    pub active: bool,

    /// Set when a ban requires the user's session to be terminated.
    pub logout_required: bool,

    pub joined_at: Timestamp,

    /// Registration order, breaks ties between equal join timestamps.
    pub joined_seq: u64,

    /// Users this user follows (directed; self-follow is not rejected).
    pub follows: HashSet<UserId>,

    /// Communities (expertise areas) this user has joined.
    pub communities: HashSet<AreaId>,
}

// ============================================================================
// Posts
// ============================================================================

/// One expertise area the classifier detected on a post, with its rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostClassification {
    pub area: AreaId,
    pub rating: Option<TruthRating>,
}

/// A submitted post.
///
/// The author and content are immutable once created; only the published
/// flag and the derived classifications change after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub content: String,
    pub published: bool,
    pub submitted_at: Timestamp,

    /// Creation order, breaks ties between equal submission timestamps.
    pub seq: u64,

    pub cites: Option<PostId>,
    pub replies_to: Option<PostId>,
    pub classifications: Vec<PostClassification>,
}

impl Post {
    /// Expertise areas this post was classified into.
    pub fn classified_areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.classifications.iter().map(|c| c.area)
    }
}

// ============================================================================
// Expertise Areas
// ============================================================================

/// A topic that doubles as a community identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertiseArea {
    pub id: AreaId,
    pub label: String,
}

// ============================================================================
// Ratings
// ============================================================================

/// One user's rating of one post, unique per (rater, post, rating type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRating {
    pub rater: UserId,
    pub post: PostId,
    pub rating_type: String,
    pub rating_score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(PostId::new(), PostId::new());
        assert_ne!(AreaId::new(), AreaId::new());
    }

    #[test]
    fn test_id_display_is_uuid() {
        let id = UserId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp(10) < Timestamp(11));
        assert_eq!(Timestamp(10), Timestamp(10));
    }
}
