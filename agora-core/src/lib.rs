//! Social-graph ranking and moderation engine.
//!
//! This crate provides:
//! - Personalized timelines under follow-based and community visibility
//! - A fame ledger with demotions, bans and community eviction
//! - Reputation-similarity ranking between users
//! - Post submission orchestration over a pluggable content classifier
//!
//! # Quick Start
//!
//! ```
//! use agora_core::{SocialNetwork, TimelineQuery};
//! use veracity::LexiconClassifier;
//!
//! # fn main() -> Result<(), agora_core::SocialError> {
//! let mut network = SocialNetwork::new(LexiconClassifier::new());
//!
//! let ada = network.store_mut().create_user("ada@example.com", "Ada", "Lovelace");
//! let bob = network.store_mut().create_user("bob@example.com", "Bob", "Noble");
//! network.follow(bob, ada)?;
//!
//! network.submit_post(ada, "A new proof of the prime number theorem", None, None)?;
//!
//! let feed = network.timeline(bob, &TimelineQuery::new())?;
//! assert_eq!(feed.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod fame;
pub mod model;
pub mod network;
pub mod persist;
pub mod similarity;
pub mod store;
pub mod testing;
pub mod timeline;

// Primary public API
pub use fame::{
    bullshitters, Fame, FameEffect, FameEngine, FameEvent, FameLadder, FameLevel,
    NegativeFameEntry,
};
pub use model::{
    AreaId, ExpertiseArea, Post, PostClassification, PostId, Timestamp, User, UserId, UserRating,
};
pub use network::{RatingOutcome, SocialError, SocialNetwork, SubmissionOutcome};
pub use persist::{PersistError, SavedNetwork};
pub use similarity::similar_users;
pub use store::{EntityStore, StoreError};
pub use testing::{MockClassifier, TestHarness};
pub use timeline::TimelineQuery;

#[cfg(test)]
mod tests {
    use super::*;
    use veracity::LexiconClassifier;

    /// End-to-end pass with the real lexicon classifier instead of a mock.
    #[test]
    fn test_lexicon_submission_flow() {
        let mut network = SocialNetwork::new(LexiconClassifier::new());
        let ada = network
            .store_mut()
            .create_user("ada@example.com", "Ada", "Lovelace");

        let clean = network
            .submit_post(ada, "A new proof of the prime number theorem", None, None)
            .unwrap();
        assert!(clean.published);

        let junk = network
            .submit_post(ada, "This miracle cure rewrites medicine", None, None)
            .unwrap();
        assert!(!junk.published);
        assert!(!junk.banned);

        // The fabricated rating entered the ledger at the entry tier.
        let (_, records) = network.fame(ada).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level.numeric_value, -10);
    }
}
