//! Testing utilities for the ranking and moderation engine.
//!
//! This module provides tools for integration testing:
//! - `MockClassifier` for deterministic testing without a real lexicon
//! - `TestHarness` for scripted submission scenarios
//! - Assertion helpers for verifying ledger and publication state

use crate::model::{AreaId, PostId, Timestamp, UserId};
use crate::network::{SocialNetwork, SubmissionOutcome};
use std::cell::RefCell;
use std::collections::VecDeque;
use veracity::{Analysis, Classification, Classifier, Error, TruthRating};

/// A mock classifier that returns scripted analyses.
///
/// Returns queued analyses in order; once the queue is exhausted, every
/// classification comes back empty (no detected areas).
pub struct MockClassifier {
    responses: RefCell<VecDeque<Analysis>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(VecDeque::new()),
        }
    }

    /// Queue an analysis to return on the next classification.
    pub fn queue(&self, analysis: Analysis) {
        self.responses.borrow_mut().push_back(analysis);
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _content: &str) -> Result<Analysis, Error> {
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }
}

// ============================================================================
// Scripted classification builders
// ============================================================================

/// An area detected with a mildly positive rating.
pub fn plausible(area: &str) -> Classification {
    Classification::new(area, Some(TruthRating::new("plausible", 20, false)))
}

/// An area detected without any veracity judgement.
pub fn unrated(area: &str) -> Classification {
    Classification::new(area, None)
}

/// An area detected with a negative, non-bullshit rating.
pub fn negative(area: &str, value: i32) -> Classification {
    Classification::new(area, Some(TruthRating::new("unsupported", value, false)))
}

/// An area detected with fabricated content.
pub fn bullshit(area: &str) -> Classification {
    Classification::new(area, Some(TruthRating::new("fabricated", -80, true)))
}

// ============================================================================
// Harness
// ============================================================================

/// Test harness for running submission scenarios.
pub struct TestHarness {
    /// The network under test, driven by a `MockClassifier`.
    pub network: SocialNetwork<MockClassifier>,
    next_join: u64,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            network: SocialNetwork::new(MockClassifier::new()),
            next_join: 1_000,
        }
    }

    /// Register a user; join timestamps increase with registration order.
    pub fn add_user(&mut self, handle: &str) -> UserId {
        let joined_at = Timestamp(self.next_join);
        self.next_join += 1;
        self.network.store_mut().create_user_at(
            format!("{handle}@example.com"),
            handle,
            "Tester",
            joined_at,
        )
    }

    /// Queue the analysis the classifier returns for the next submission.
    pub fn expect_analysis(&mut self, classifications: Vec<Classification>) -> &mut Self {
        self.network.classifier().queue(Analysis::new(classifications));
        self
    }

    /// Submit a post, panicking on contract errors.
    pub fn submit(&mut self, author: UserId, content: &str) -> SubmissionOutcome {
        self.network
            .submit_post(author, content, None, None)
            .expect("submission failed")
    }

    /// Create the area if needed and join the user to its community.
    pub fn join(&mut self, user: UserId, label: &str) -> AreaId {
        let area = self.network.store_mut().get_or_create_area(label);
        self.network
            .join_community(user, area)
            .expect("join failed");
        area
    }

    pub fn area(&self, label: &str) -> Option<AreaId> {
        self.network.store().area_by_label(label).map(|a| a.id)
    }

    /// The user's fame value in the labeled area, if any.
    pub fn fame_value(&self, user: UserId, label: &str) -> Option<i32> {
        let area = self.area(label)?;
        self.network
            .store()
            .fame(user, area)
            .map(|f| f.level.numeric_value)
    }

    pub fn is_active(&self, user: UserId) -> bool {
        self.network
            .store()
            .user(user)
            .map(|u| u.active)
            .unwrap_or(false)
    }

    pub fn is_published(&self, post: PostId) -> bool {
        self.network
            .store()
            .post(post)
            .map(|p| p.published)
            .unwrap_or(false)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the user holds the expected fame value in the labeled area.
#[track_caller]
pub fn assert_fame(harness: &TestHarness, user: UserId, label: &str, expected: i32) {
    let actual = harness.fame_value(user, label);
    assert_eq!(
        actual,
        Some(expected),
        "Expected fame {expected} in '{label}', got {actual:?}"
    );
}

/// Assert the user holds no fame record in the labeled area.
#[track_caller]
pub fn assert_no_fame(harness: &TestHarness, user: UserId, label: &str) {
    let actual = harness.fame_value(user, label);
    assert!(
        actual.is_none(),
        "Expected no fame in '{label}', got {actual:?}"
    );
}

/// Assert the user has been banned.
#[track_caller]
pub fn assert_banned(harness: &TestHarness, user: UserId) {
    assert!(!harness.is_active(user), "Expected user to be banned");
}

/// Assert the user has NOT been banned.
#[track_caller]
pub fn assert_active(harness: &TestHarness, user: UserId) {
    assert!(harness.is_active(user), "Expected user to be active");
}

/// Assert the post is published.
#[track_caller]
pub fn assert_published(harness: &TestHarness, post: PostId) {
    assert!(harness.is_published(post), "Expected post to be published");
}

/// Assert the post is NOT published.
#[track_caller]
pub fn assert_unpublished(harness: &TestHarness, post: PostId) {
    assert!(!harness.is_published(post), "Expected post to be unpublished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_classifier_returns_scripted_then_empty() {
        let classifier = MockClassifier::new();
        classifier.queue(Analysis::new(vec![plausible("Physics")]));

        let first = classifier.classify("anything").unwrap();
        assert_eq!(first.classifications.len(), 1);

        let second = classifier.classify("anything else").unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_harness_basic_submission() {
        let mut harness = TestHarness::new();
        let author = harness.add_user("ada");

        harness.expect_analysis(vec![plausible("Physics")]);
        let outcome = harness.submit(author, "gravity bends light");

        assert_published(&harness, outcome.post);
        assert_active(&harness, author);
        assert_no_fame(&harness, author, "Physics");
    }

    #[test]
    fn test_harness_demotion_scenario() {
        let mut harness = TestHarness::new();
        let author = harness.add_user("ada");

        harness.expect_analysis(vec![negative("Physics", -20)]);
        let outcome = harness.submit(author, "i heard something");

        assert_fame(&harness, author, "Physics", -10);
        assert_published(&harness, outcome.post);
    }

    #[test]
    fn test_harness_join_registers_membership() {
        let mut harness = TestHarness::new();
        let user = harness.add_user("ada");
        let area = harness.join(user, "Physics");

        assert!(harness
            .network
            .store()
            .user(user)
            .unwrap()
            .communities
            .contains(&area));
    }

    #[test]
    fn test_users_join_in_increasing_timestamp_order() {
        let mut harness = TestHarness::new();
        let first = harness.add_user("ada");
        let second = harness.add_user("bob");

        let store = harness.network.store();
        assert!(store.user(first).unwrap().joined_at < store.user(second).unwrap().joined_at);
    }
}
