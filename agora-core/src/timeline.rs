//! Timeline and search over a store snapshot.
//!
//! Both entry points are pure functions of an `&EntityStore`: callers pass
//! an explicit point-in-time read, which keeps visibility rules testable
//! without a live store behind them.

use crate::model::{Post, UserId};
use crate::store::{EntityStore, StoreError};

/// Parameters for a timeline read.
#[derive(Debug, Clone)]
pub struct TimelineQuery {
    /// Zero-based index of the first post to return.
    pub start: usize,

    /// Zero-based index of the last post to return, inclusive. None reads
    /// to the end.
    pub end: Option<usize>,

    /// Requested published flag for posts the viewer does not own.
    pub published: bool,

    /// Community visibility instead of follow-based visibility.
    pub community_mode: bool,
}

impl TimelineQuery {
    pub fn new() -> Self {
        Self {
            start: 0,
            end: None,
            published: true,
            community_mode: false,
        }
    }

    pub fn with_range(mut self, start: usize, end: Option<usize>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn with_community_mode(mut self, community_mode: bool) -> Self {
        self.community_mode = community_mode;
        self
    }
}

impl Default for TimelineQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the viewer's timeline.
///
/// Standard mode shows posts by followed users matching the requested
/// published flag, plus every post the viewer authored. Community mode
/// shows a post when viewer and author share a community that is also one
/// of the post's classified areas, and the post matches the requested flag
/// or is the viewer's own.
pub fn timeline(
    store: &EntityStore,
    viewer: UserId,
    query: &TimelineQuery,
) -> Result<Vec<Post>, StoreError> {
    let user = store.user(viewer)?;

    let mut visible: Vec<&Post> = store
        .posts()
        .filter(|post| {
            if query.community_mode {
                // The shared-community requirement applies to the viewer's
                // own posts as well; only the published check is waived.
                let Ok(author) = store.user(post.author) else {
                    return false;
                };
                let shared_area_on_post = post.classifications.iter().any(|c| {
                    user.communities.contains(&c.area) && author.communities.contains(&c.area)
                });
                shared_area_on_post
                    && (post.published == query.published || post.author == viewer)
            } else {
                post.author == viewer
                    || (user.follows.contains(&post.author) && post.published == query.published)
            }
        })
        .collect();

    sort_reverse_chronological(&mut visible);
    Ok(slice(&visible, query.start, query.end))
}

/// Search published-state posts by keyword.
///
/// Case-insensitive substring match over content and the author's email,
/// first and last name.
pub fn search(
    store: &EntityStore,
    keyword: &str,
    start: usize,
    end: Option<usize>,
    published: bool,
) -> Vec<Post> {
    let needle = keyword.to_lowercase();

    let mut hits: Vec<&Post> = store
        .posts()
        .filter(|post| post.published == published)
        .filter(|post| {
            if post.content.to_lowercase().contains(&needle) {
                return true;
            }
            let Ok(author) = store.user(post.author) else {
                return false;
            };
            author.email.to_lowercase().contains(&needle)
                || author.first_name.to_lowercase().contains(&needle)
                || author.last_name.to_lowercase().contains(&needle)
        })
        .collect();

    sort_reverse_chronological(&mut hits);
    slice(&hits, start, end)
}

/// Newest first; equal timestamps keep creation order.
fn sort_reverse_chronological(posts: &mut [&Post]) {
    posts.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then(a.seq.cmp(&b.seq))
    });
}

/// Inclusive `[start, end]` slice; out-of-range bounds yield empty.
fn slice(posts: &[&Post], start: usize, end: Option<usize>) -> Vec<Post> {
    if start >= posts.len() {
        return Vec::new();
    }
    let stop = match end {
        Some(end) if end < start => return Vec::new(),
        Some(end) => (end + 1).min(posts.len()),
        None => posts.len(),
    };
    posts[start..stop].iter().map(|p| (*p).clone()).collect()
}
