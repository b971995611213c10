//! Fame ledger engine with an event/effect system.
//!
//! This module implements the reputation pipeline:
//! 1. Post submission raises a `FameEvent` (negative rating, membership audit)
//! 2. `FameEngine` resolves the event against the current ledger
//! 3. `FameEffect`s are produced that describe concrete state changes
//! 4. Effects are applied to the entity store
//!
//! This separation keeps the demotion state machine deterministic and
//! testable independent of classification and orchestration.

use crate::model::{AreaId, UserId};
use crate::store::EntityStore;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Name of the top tier; fame below it revokes community membership.
pub const SUPER_PRO: &str = "Super Pro";

/// Tier a user enters the ledger at on their first negative rating.
pub const ENTRY_LEVEL: &str = "Confuser";
const ENTRY_LEVEL_VALUE: i32 = -10;

/// One reputation tier. Totally ordered by numeric value within a ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FameLevel {
    pub name: String,
    pub numeric_value: i32,
}

impl FameLevel {
    pub fn new(name: impl Into<String>, numeric_value: i32) -> Self {
        Self {
            name: name.into(),
            numeric_value,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.numeric_value < 0
    }
}

lazy_static! {
    /// Standard reputation tiers, worst to best.
    static ref STANDARD_LEVELS: Vec<FameLevel> = vec![
        FameLevel::new("Bullshitter", -100),
        FameLevel::new("Fabulist", -30),
        FameLevel::new(ENTRY_LEVEL, ENTRY_LEVEL_VALUE),
        FameLevel::new("Apprentice", 10),
        FameLevel::new("Knowledgeable", 30),
        FameLevel::new("Pro", 60),
        FameLevel::new(SUPER_PRO, 100),
    ];
}

/// The ordered set of fame levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FameLadder {
    /// Ascending by numeric value.
    levels: Vec<FameLevel>,
}

impl FameLadder {
    pub fn new(mut levels: Vec<FameLevel>) -> Self {
        levels.sort_by_key(|l| l.numeric_value);
        Self { levels }
    }

    /// The standard seven-tier ladder.
    pub fn standard() -> Self {
        Self::new(STANDARD_LEVELS.clone())
    }

    pub fn levels(&self) -> &[FameLevel] {
        &self.levels
    }

    pub fn level(&self, name: &str) -> Option<&FameLevel> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Lowest tier.
    pub fn floor(&self) -> Option<&FameLevel> {
        self.levels.first()
    }

    /// Highest tier.
    pub fn top(&self) -> Option<&FameLevel> {
        self.levels.last()
    }

    /// The immediate predecessor of `level` in the total order.
    pub fn next_lower(&self, level: &FameLevel) -> Option<&FameLevel> {
        self.levels
            .iter()
            .rev()
            .find(|l| l.numeric_value < level.numeric_value)
    }

    /// Insert a level unless one with the same name exists.
    pub fn insert_if_missing(&mut self, level: FameLevel) {
        if self.level(&level.name).is_none() {
            self.levels.push(level);
            self.levels.sort_by_key(|l| l.numeric_value);
        }
    }

    /// Tier assigned on first negative rating.
    pub fn entry_level(&self) -> FameLevel {
        self.level(ENTRY_LEVEL)
            .cloned()
            .unwrap_or_else(|| FameLevel::new(ENTRY_LEVEL, ENTRY_LEVEL_VALUE))
    }
}

impl Default for FameLadder {
    fn default() -> Self {
        Self::standard()
    }
}

/// One user's reputation in one expertise area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fame {
    pub user: UserId,
    pub area: AreaId,
    pub level: FameLevel,
}

// ============================================================================
// Events and effects
// ============================================================================

/// A reputation event for the engine to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FameEvent {
    /// The classifier rated the user's content negatively in an area.
    NegativeRating { user: UserId, area: AreaId },

    /// Re-check community eligibility after the ledger may have moved.
    MembershipAudit { user: UserId, area: AreaId },
}

/// Concrete state changes produced by resolving a fame event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FameEffect {
    /// First negative event in an area: ledger entry created at the entry tier.
    FameInitialized {
        user: UserId,
        area: AreaId,
        level: FameLevel,
    },

    /// Reputation stepped down one tier.
    FameDemoted {
        user: UserId,
        area: AreaId,
        from: FameLevel,
        to: FameLevel,
    },

    /// Already at the floor: the account is deactivated and must log out.
    UserBanned { user: UserId },

    /// Every post by the author is unpublished.
    AllPostsUnpublished { author: UserId },

    /// Fame fell below the top tier: community membership is revoked.
    CommunityEvicted { user: UserId, area: AreaId },
}

/// Resolves fame events into effects against a ledger snapshot.
pub struct FameEngine;

impl FameEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve an event. Pure: reads the store, never mutates it.
    pub fn resolve(&self, store: &EntityStore, event: FameEvent) -> Vec<FameEffect> {
        match event {
            FameEvent::NegativeRating { user, area } => {
                self.resolve_negative_rating(store, user, area)
            }
            FameEvent::MembershipAudit { user, area } => {
                self.resolve_membership_audit(store, user, area)
            }
        }
    }

    fn resolve_negative_rating(
        &self,
        store: &EntityStore,
        user: UserId,
        area: AreaId,
    ) -> Vec<FameEffect> {
        let Some(fame) = store.fame(user, area) else {
            return vec![FameEffect::FameInitialized {
                user,
                area,
                level: store.ladder().entry_level(),
            }];
        };

        match store.ladder().next_lower(&fame.level) {
            Some(lower) => vec![FameEffect::FameDemoted {
                user,
                area,
                from: fame.level.clone(),
                to: lower.clone(),
            }],
            // At the floor already: the ban is terminal and repeatable.
            None => vec![
                FameEffect::UserBanned { user },
                FameEffect::AllPostsUnpublished { author: user },
            ],
        }
    }

    /// Best effort: missing fame or ladder tiers yield no effects.
    fn resolve_membership_audit(
        &self,
        store: &EntityStore,
        user: UserId,
        area: AreaId,
    ) -> Vec<FameEffect> {
        let Some(fame) = store.fame(user, area) else {
            return Vec::new();
        };
        let Some(top) = store.ladder().level(SUPER_PRO) else {
            return Vec::new();
        };
        if fame.level.numeric_value >= top.numeric_value {
            return Vec::new();
        }
        let Ok(member) = store.user(user) else {
            return Vec::new();
        };
        if !member.communities.contains(&area) {
            return Vec::new();
        }
        vec![FameEffect::CommunityEvicted { user, area }]
    }
}

impl Default for FameEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply resolved effects to the store, in order.
pub fn apply_effects(store: &mut EntityStore, effects: &[FameEffect]) {
    for effect in effects {
        match effect {
            FameEffect::FameInitialized { user, area, level } => {
                store.ladder_mut().insert_if_missing(level.clone());
                store.set_fame(*user, *area, level.clone());
                debug!(user = %user, area = %area, level = %level.name, "fame ledger entry created");
            }
            FameEffect::FameDemoted { user, area, to, .. } => {
                store.set_fame(*user, *area, to.clone());
                debug!(user = %user, area = %area, level = %to.name, "fame demoted");
            }
            FameEffect::UserBanned { user } => {
                if let Ok(record) = store.user_mut(*user) {
                    record.active = false;
                    record.logout_required = true;
                }
                warn!(user = %user, "user banned");
            }
            FameEffect::AllPostsUnpublished { author } => {
                let count = store.unpublish_all_by(*author);
                warn!(author = %author, count, "all posts unpublished");
            }
            FameEffect::CommunityEvicted { user, area } => {
                let _ = store.leave_community(*user, *area);
                debug!(user = %user, area = %area, "evicted from community");
            }
        }
    }
}

// ============================================================================
// Bullshitters report
// ============================================================================

/// One negative-fame holder in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeFameEntry {
    pub user: UserId,
    pub fame_level_numeric: i32,
}

/// Map each expertise area to its negative-fame holders.
///
/// Within an area, entries are ordered worst fame first; ties are broken by
/// join time, most recently joined first. Areas without a negative-fame
/// holder are omitted entirely.
pub fn bullshitters(store: &EntityStore) -> HashMap<AreaId, Vec<NegativeFameEntry>> {
    let mut report = HashMap::new();
    for area in store.areas() {
        let mut holders: Vec<_> = store
            .fame_records()
            .filter(|f| f.area == area.id && f.level.is_negative())
            .filter_map(|f| store.user(f.user).ok().map(|u| (f, u)))
            .collect();

        if holders.is_empty() {
            continue;
        }

        holders.sort_by(|(fa, ua), (fb, ub)| {
            fa.level
                .numeric_value
                .cmp(&fb.level.numeric_value)
                .then(ub.joined_at.cmp(&ua.joined_at))
                .then(ub.joined_seq.cmp(&ua.joined_seq))
        });

        report.insert(
            area.id,
            holders
                .into_iter()
                .map(|(f, _)| NegativeFameEntry {
                    user: f.user,
                    fame_level_numeric: f.level.numeric_value,
                })
                .collect(),
        );
    }
    report
}
