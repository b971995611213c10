//! Similarity ranking between users over shared-area reputations.

use crate::model::{User, UserId};
use crate::store::{EntityStore, StoreError};
use std::cmp::Ordering;

/// Two fame values in the same area count as matching within this distance.
const MATCH_DISTANCE: i32 = 100;

/// Rank every other user by reputation similarity to `user`.
///
/// For each expertise area where `user` holds a fame record, another user
/// matches when their fame value in that area is within [`MATCH_DISTANCE`];
/// a missing record never matches. Similarity is the matching fraction over
/// the user's areas. Users with similarity zero are excluded; the rest are
/// ordered by similarity descending, then join time descending.
///
/// The whole computation runs against the single store snapshot borrowed
/// here, so no comparison can observe a partially updated ledger.
pub fn similar_users(store: &EntityStore, user: UserId) -> Result<Vec<(User, f64)>, StoreError> {
    store.user(user)?;

    let own: Vec<(_, i32)> = store
        .fame_of(user)
        .into_iter()
        .map(|f| (f.area, f.level.numeric_value))
        .collect();
    if own.is_empty() {
        return Ok(Vec::new());
    }
    let n = own.len() as f64;

    let mut ranked: Vec<(User, f64)> = Vec::new();
    for other in store.users() {
        if other.id == user {
            continue;
        }
        let matching = own
            .iter()
            .filter(|(area, value)| {
                store
                    .fame(other.id, *area)
                    .is_some_and(|f| (f.level.numeric_value - value).abs() <= MATCH_DISTANCE)
            })
            .count();
        if matching == 0 {
            continue;
        }
        ranked.push((other.clone(), matching as f64 / n));
    }

    ranked.sort_by(|(ua, sa), (ub, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then(ub.joined_at.cmp(&ua.joined_at))
            .then(ub.joined_seq.cmp(&ua.joined_seq))
    });
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fame::FameLevel;
    use crate::model::Timestamp;

    fn user(store: &mut EntityStore, email: &str, joined: u64) -> UserId {
        store.create_user_at(email, "Test", "User", Timestamp(joined))
    }

    #[test]
    fn test_equal_vectors_give_full_similarity() {
        let mut store = EntityStore::new();
        let a = user(&mut store, "a@example.com", 10);
        let b = user(&mut store, "b@example.com", 20);
        let area = store.get_or_create_area("Physics");

        store.set_fame(a, area, FameLevel::new("Pro", 50));
        store.set_fame(b, area, FameLevel::new("Pro", 50));

        let ranked = similar_users(&store, a).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, b);
        assert_eq!(ranked[0].1, 1.0);
    }

    #[test]
    fn test_missing_record_is_infinitely_dissimilar() {
        let mut store = EntityStore::new();
        let a = user(&mut store, "a@example.com", 10);
        let _b = user(&mut store, "b@example.com", 20);
        let area = store.get_or_create_area("Physics");

        store.set_fame(a, area, FameLevel::new("Pro", 50));

        // B has no record in the area: similarity 0, excluded entirely.
        assert!(similar_users(&store, a).unwrap().is_empty());
    }

    #[test]
    fn test_distance_boundary_is_inclusive() {
        let mut store = EntityStore::new();
        let a = user(&mut store, "a@example.com", 10);
        let near = user(&mut store, "near@example.com", 20);
        let far = user(&mut store, "far@example.com", 30);
        let area = store.get_or_create_area("Physics");

        store.set_fame(a, area, FameLevel::new("Pro", 50));
        store.set_fame(near, area, FameLevel::new("Low", -50));
        store.set_fame(far, area, FameLevel::new("Lower", -51));

        let ranked = similar_users(&store, a).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, near);
    }

    #[test]
    fn test_fraction_over_own_areas_and_ordering() {
        let mut store = EntityStore::new();
        let me = user(&mut store, "me@example.com", 10);
        let half = user(&mut store, "half@example.com", 20);
        let full_early = user(&mut store, "fe@example.com", 30);
        let full_late = user(&mut store, "fl@example.com", 40);

        let physics = store.get_or_create_area("Physics");
        let math = store.get_or_create_area("Math");

        store.set_fame(me, physics, FameLevel::new("Pro", 50));
        store.set_fame(me, math, FameLevel::new("Pro", 50));

        store.set_fame(half, physics, FameLevel::new("Pro", 50));

        for id in [full_early, full_late] {
            store.set_fame(id, physics, FameLevel::new("Pro", 60));
            store.set_fame(id, math, FameLevel::new("Pro", 40));
        }

        let ranked = similar_users(&store, me).unwrap();
        let ids: Vec<_> = ranked.iter().map(|(u, _)| u.id).collect();

        // Full matches first, most recently joined breaking the tie.
        assert_eq!(ids, vec![full_late, full_early, half]);
        assert_eq!(ranked[0].1, 1.0);
        assert_eq!(ranked[2].1, 0.5);
    }

    #[test]
    fn test_no_own_fame_means_empty_result() {
        let mut store = EntityStore::new();
        let a = user(&mut store, "a@example.com", 10);
        let b = user(&mut store, "b@example.com", 20);
        let area = store.get_or_create_area("Physics");
        store.set_fame(b, area, FameLevel::new("Pro", 50));

        assert!(similar_users(&store, a).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let store = EntityStore::new();
        assert!(similar_users(&store, UserId::new()).is_err());
    }
}
