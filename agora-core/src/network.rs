//! SocialNetwork - the primary public API for the ranking and moderation
//! engine.
//!
//! This module wires the content classifier, the fame ledger engine and the
//! entity store into the in-process operation contracts: timelines, search,
//! follows, communities, post submission, ratings and the reputation
//! reports.

use crate::fame::{self, Fame, FameEffect, FameEngine, FameEvent, NegativeFameEntry};
use crate::model::{AreaId, Post, PostClassification, PostId, Timestamp, User, UserId};
use crate::similarity;
use crate::store::{EntityStore, StoreError};
use crate::timeline::{self, TimelineQuery};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;
use veracity::Classifier;

/// Errors from network operations.
#[derive(Debug, Error)]
pub enum SocialError {
    /// A record the contract requires was absent.
    #[error(transparent)]
    NotFound(#[from] StoreError),

    /// The operation is forbidden for this caller.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("classifier error: {0}")]
    Classifier(#[from] veracity::Error),
}

/// Result of submitting a post.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub post: PostId,
    pub published: bool,

    /// Expertise areas and ratings the classifier derived, in classifier
    /// order.
    pub classifications: Vec<PostClassification>,

    /// The author was banned during this submission and must be logged out.
    pub banned: bool,
}

/// Whether a rating was newly created or updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    New,
    Updated,
}

/// The social network engine.
///
/// Owns the entity store and the classifier collaborator. All operations
/// are synchronous; multi-step sequences commit per step (see `store`).
pub struct SocialNetwork<C> {
    classifier: C,
    store: EntityStore,
}

impl<C: Classifier> SocialNetwork<C> {
    /// Create a network with an empty store.
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            store: EntityStore::new(),
        }
    }

    /// Create a network over an existing store, e.g. a loaded snapshot.
    pub fn with_store(classifier: C, store: EntityStore) -> Self {
        Self { classifier, store }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Direct store access. Mutations bypass the moderation rules.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    // ========================================================================
    // Feeds
    // ========================================================================

    /// The viewer's timeline under the query's visibility mode.
    pub fn timeline(&self, viewer: UserId, query: &TimelineQuery) -> Result<Vec<Post>, SocialError> {
        Ok(timeline::timeline(&self.store, viewer, query)?)
    }

    /// Keyword search over posts and author names.
    pub fn search(
        &self,
        keyword: &str,
        start: usize,
        end: Option<usize>,
        published: bool,
    ) -> Vec<Post> {
        timeline::search(&self.store, keyword, start, end, published)
    }

    // ========================================================================
    // Follows
    // ========================================================================

    /// Users followed by `user`, in registration order.
    pub fn follows(
        &self,
        user: UserId,
        start: usize,
        end: Option<usize>,
    ) -> Result<Vec<User>, SocialError> {
        let record = self.store.user(user)?;
        let mut list: Vec<User> = record
            .follows
            .iter()
            .filter_map(|id| self.store.user(*id).ok())
            .cloned()
            .collect();
        list.sort_by_key(|u| u.joined_seq);
        Ok(page(list, start, end))
    }

    /// Users following `user`, in registration order.
    pub fn followers(
        &self,
        user: UserId,
        start: usize,
        end: Option<usize>,
    ) -> Result<Vec<User>, SocialError> {
        self.store.user(user)?;
        let mut list: Vec<User> = self
            .store
            .users()
            .filter(|u| u.follows.contains(&user))
            .cloned()
            .collect();
        list.sort_by_key(|u| u.joined_seq);
        Ok(page(list, start, end))
    }

    /// Follow a user. Returns false if already followed.
    pub fn follow(&mut self, user: UserId, target: UserId) -> Result<bool, SocialError> {
        Ok(self.store.add_follow(user, target)?)
    }

    /// Unfollow a user. Returns false if not followed anyway.
    pub fn unfollow(&mut self, user: UserId, target: UserId) -> Result<bool, SocialError> {
        Ok(self.store.remove_follow(user, target)?)
    }

    // ========================================================================
    // Communities
    // ========================================================================

    /// Join a community. Does not check eligibility. Returns false if
    /// already a member.
    pub fn join_community(&mut self, user: UserId, area: AreaId) -> Result<bool, SocialError> {
        Ok(self.store.join_community(user, area)?)
    }

    /// Leave a community. Returns false if not a member anyway.
    pub fn leave_community(&mut self, user: UserId, area: AreaId) -> Result<bool, SocialError> {
        Ok(self.store.leave_community(user, area)?)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit a post for publication.
    ///
    /// The steps commit in order, and each step's side effects are visible
    /// to the next: persist unpublished, classify, then walk the classified
    /// areas applying the fame consequences - existing negative fame blocks
    /// publication, negative ratings demote (possibly banning the author at
    /// the ladder floor), and any fame below the top tier revokes community
    /// membership best-effort. The final published flag is persisted last.
    pub fn submit_post(
        &mut self,
        author: UserId,
        content: &str,
        cites: Option<PostId>,
        replies_to: Option<PostId>,
    ) -> Result<SubmissionOutcome, SocialError> {
        self.store.user(author)?;

        let post = self
            .store
            .create_post(author, content, cites, replies_to, Timestamp::now())?;

        let analysis = self.classifier.classify(content)?;
        let mut published = !analysis.contains_bullshit();
        let mut banned = false;

        let engine = FameEngine::new();
        let mut classifications = Vec::with_capacity(analysis.classifications.len());

        for classification in &analysis.classifications {
            let area = self.store.get_or_create_area(&classification.area);
            classifications.push(PostClassification {
                area,
                rating: classification.rating.clone(),
            });

            // A standing negative reputation in the area keeps the post
            // unpublished, before any demotion from this submission.
            if self
                .store
                .fame(author, area)
                .is_some_and(|f| f.level.is_negative())
            {
                published = false;
            }

            if classification
                .rating
                .as_ref()
                .is_some_and(|r| r.is_negative())
            {
                let effects =
                    engine.resolve(&self.store, FameEvent::NegativeRating { user: author, area });
                banned |= effects
                    .iter()
                    .any(|e| matches!(e, FameEffect::UserBanned { .. }));
                fame::apply_effects(&mut self.store, &effects);
            }

            let effects =
                engine.resolve(&self.store, FameEvent::MembershipAudit { user: author, area });
            fame::apply_effects(&mut self.store, &effects);
        }

        self.store.set_post_classifications(post, classifications.clone())?;
        self.store.set_post_published(post, published)?;

        info!(post = %post, author = %author, published, banned, "post submitted");

        Ok(SubmissionOutcome {
            post,
            published,
            classifications,
            banned,
        })
    }

    // ========================================================================
    // Ratings
    // ========================================================================

    /// Rate a post, updating in place when the (rater, post, type) rating
    /// already exists. Authors cannot rate their own posts; the check runs
    /// before any mutation.
    pub fn rate_post(
        &mut self,
        rater: UserId,
        post: PostId,
        rating_type: &str,
        rating_score: i32,
    ) -> Result<RatingOutcome, SocialError> {
        self.store.user(rater)?;
        let record = self.store.post(post)?;
        if record.author == rater {
            return Err(SocialError::PermissionDenied(
                "users cannot rate their own posts".to_string(),
            ));
        }

        if self.store.upsert_rating(rater, post, rating_type, rating_score) {
            Ok(RatingOutcome::New)
        } else {
            Ok(RatingOutcome::Updated)
        }
    }

    // ========================================================================
    // Reputation
    // ========================================================================

    /// A user together with all their fame records.
    pub fn fame(&self, user: UserId) -> Result<(User, Vec<Fame>), SocialError> {
        let record = self.store.user(user)?.clone();
        let records = self.store.fame_of(user).into_iter().cloned().collect();
        Ok((record, records))
    }

    /// Negative-fame holders per expertise area. See [`fame::bullshitters`].
    pub fn bullshitters(&self) -> HashMap<AreaId, Vec<NegativeFameEntry>> {
        fame::bullshitters(&self.store)
    }

    /// Reputation-similarity ranking. See [`similarity::similar_users`].
    pub fn similar_users(&self, user: UserId) -> Result<Vec<(User, f64)>, SocialError> {
        Ok(similarity::similar_users(&self.store, user)?)
    }
}

/// Inclusive `[start, end]` page; out-of-range bounds yield empty.
fn page<T>(items: Vec<T>, start: usize, end: Option<usize>) -> Vec<T> {
    if start >= items.len() {
        return Vec::new();
    }
    let stop = match end {
        Some(end) if end < start => return Vec::new(),
        Some(end) => (end + 1).min(items.len()),
        None => items.len(),
    };
    items.into_iter().skip(start).take(stop - start).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fame::{FameLevel, ENTRY_LEVEL, SUPER_PRO};
    use crate::testing::{
        assert_banned, assert_unpublished, bullshit, negative, plausible, MockClassifier,
        TestHarness,
    };

    #[test]
    fn test_clean_post_is_published_with_classifications() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        h.expect_analysis(vec![plausible("Physics")]);
        let outcome = h.submit(author, "gravity bends light");

        assert!(outcome.published);
        assert!(!outcome.banned);
        assert_eq!(outcome.classifications.len(), 1);

        let stored = h.network.store().post(outcome.post).unwrap();
        assert!(stored.published);
        assert_eq!(stored.classifications, outcome.classifications);
    }

    #[test]
    fn test_bullshit_content_is_never_published() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        h.expect_analysis(vec![bullshit("Medicine")]);
        let outcome = h.submit(author, "this miracle cure works");

        assert!(!outcome.published);
        assert!(!h.network.store().post(outcome.post).unwrap().published);
    }

    #[test]
    fn test_first_negative_rating_enters_ledger_but_still_publishes() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        h.expect_analysis(vec![negative("Physics", -20)]);
        let outcome = h.submit(author, "i heard gravity is optional");

        // The fame check precedes the demotion, so the first offense in an
        // area does not block this post.
        assert!(outcome.published);
        assert_eq!(h.fame_value(author, "Physics"), Some(-10));
        assert_eq!(
            h.network
                .store()
                .fame(author, h.area("Physics").unwrap())
                .unwrap()
                .level
                .name,
            ENTRY_LEVEL
        );
    }

    #[test]
    fn test_standing_negative_fame_blocks_publication_and_demotes_further() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        h.expect_analysis(vec![negative("Physics", -20)]);
        h.submit(author, "first offense");

        h.expect_analysis(vec![negative("Physics", -20)]);
        let second = h.submit(author, "second offense");

        assert!(!second.published);
        assert_eq!(h.fame_value(author, "Physics"), Some(-30));
    }

    #[test]
    fn test_ban_at_ladder_floor_unpublishes_all_posts() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        // An older, clean post about an unrelated area.
        h.expect_analysis(vec![plausible("History")]);
        let clean = h.submit(author, "the empire fell slowly");
        assert!(clean.published);

        // Confuser -> Fabulist -> Bullshitter, then the ban.
        let mut last = None;
        for text in ["one", "two", "three", "four"] {
            h.expect_analysis(vec![negative("Physics", -20)]);
            last = Some(h.submit(author, text));
        }
        let last = last.unwrap();

        assert!(last.banned);
        assert!(!last.published);

        assert_banned(&h, author);
        assert!(h.network.store().user(author).unwrap().logout_required);

        // The ban cascade reached the unrelated-area post too.
        assert_unpublished(&h, clean.post);
    }

    #[test]
    fn test_banned_outcome_repeats_without_further_change() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");

        for text in ["one", "two", "three", "four", "five"] {
            h.expect_analysis(vec![negative("Physics", -20)]);
            h.submit(author, text);
        }

        let store = h.network.store();
        assert!(!store.user(author).unwrap().active);
        assert_eq!(store.fame(author, h.area("Physics").unwrap()).unwrap().level.numeric_value, -100);
        assert!(store.posts().all(|p| !p.published));
    }

    #[test]
    fn test_demotion_evicts_from_matching_community() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        let physics = h.join(author, "Physics");

        h.expect_analysis(vec![negative("Physics", -20)]);
        h.submit(author, "i heard something dubious");

        // Confuser is below Super Pro, so membership is revoked.
        assert!(!h
            .network
            .store()
            .user(author)
            .unwrap()
            .communities
            .contains(&physics));
    }

    #[test]
    fn test_super_pro_keeps_community_membership() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        let physics = h.join(author, "Physics");
        h.network.store_mut().set_fame(
            author,
            physics,
            FameLevel::new(SUPER_PRO, 100),
        );

        h.expect_analysis(vec![plausible("Physics")]);
        h.submit(author, "solid physics content");

        assert!(h
            .network
            .store()
            .user(author)
            .unwrap()
            .communities
            .contains(&physics));
    }

    #[test]
    fn test_self_rating_is_rejected_before_any_mutation() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        h.expect_analysis(vec![plausible("Physics")]);
        let post = h.submit(author, "my own post").post;

        let result = h.network.rate_post(author, post, "like", 5);
        assert!(matches!(result, Err(SocialError::PermissionDenied(_))));
        assert!(h.network.store().ratings().is_empty());
    }

    #[test]
    fn test_rating_twice_updates_in_place() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        let rater = h.add_user("bob");
        h.expect_analysis(vec![plausible("Physics")]);
        let post = h.submit(author, "a post worth rating").post;

        assert_eq!(
            h.network.rate_post(rater, post, "like", 4).unwrap(),
            RatingOutcome::New
        );
        assert_eq!(
            h.network.rate_post(rater, post, "like", 1).unwrap(),
            RatingOutcome::Updated
        );

        let ratings = h.network.store().ratings();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].rating_score, 1);
    }

    #[test]
    fn test_follow_and_unfollow_signal_existing_state() {
        let mut h = TestHarness::new();
        let a = h.add_user("ada");
        let b = h.add_user("bob");

        assert!(h.network.follow(a, b).unwrap());
        assert!(!h.network.follow(a, b).unwrap());
        assert!(h.network.unfollow(a, b).unwrap());
        assert!(!h.network.unfollow(a, b).unwrap());
    }

    #[test]
    fn test_follows_and_followers_are_paginated() {
        let mut h = TestHarness::new();
        let a = h.add_user("ada");
        let b = h.add_user("bob");
        let c = h.add_user("cyd");

        h.network.follow(a, b).unwrap();
        h.network.follow(a, c).unwrap();
        h.network.follow(b, a).unwrap();

        let followed = h.network.follows(a, 0, None).unwrap();
        assert_eq!(followed.len(), 2);
        assert_eq!(followed[0].id, b);

        assert_eq!(h.network.follows(a, 0, Some(0)).unwrap().len(), 1);
        assert!(h.network.follows(a, 5, None).unwrap().is_empty());

        let following = h.network.followers(a, 0, None).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].id, b);
    }

    #[test]
    fn test_join_and_leave_community_signal_existing_state() {
        let mut h = TestHarness::new();
        let a = h.add_user("ada");
        let area = h.network.store_mut().get_or_create_area("Physics");

        assert!(h.network.join_community(a, area).unwrap());
        assert!(!h.network.join_community(a, area).unwrap());
        assert!(h.network.leave_community(a, area).unwrap());
        assert!(!h.network.leave_community(a, area).unwrap());
    }

    #[test]
    fn test_fame_returns_user_and_records() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        h.expect_analysis(vec![negative("Physics", -20)]);
        h.submit(author, "dubious claim");

        let (user, records) = h.network.fame(author).unwrap();
        assert_eq!(user.id, author);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level.name, ENTRY_LEVEL);
    }

    #[test]
    fn test_bullshitters_reports_via_network() {
        let mut h = TestHarness::new();
        let author = h.add_user("ada");
        h.expect_analysis(vec![negative("Physics", -20)]);
        h.submit(author, "dubious claim");

        let report = h.network.bullshitters();
        let entries = &report[&h.area("Physics").unwrap()];
        assert_eq!(entries[0].user, author);
        assert_eq!(entries[0].fame_level_numeric, -10);
    }

    #[test]
    fn test_unknown_user_surfaces_not_found() {
        let mut network = SocialNetwork::new(MockClassifier::new());
        let ghost = UserId::new();

        assert!(matches!(
            network.submit_post(ghost, "hello", None, None),
            Err(SocialError::NotFound(_))
        ));
        assert!(matches!(
            network.fame(ghost),
            Err(SocialError::NotFound(_))
        ));
    }
}
