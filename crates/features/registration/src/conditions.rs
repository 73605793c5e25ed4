//! Condition set merge.

use chrono::{DateTime, Utc};
use hostbind_domain::Condition;

/// Stamps transition times on `new` against the `previous` set.
///
/// A condition keeps the previous `lastTransitionTime` when a condition of the same type
/// had the same status; otherwise it is stamped with `now`. Types missing from `new` are
/// dropped, and the output keeps the order of `new`.
#[must_use]
pub fn merge(new: Vec<Condition>, previous: &[Condition], now: DateTime<Utc>) -> Vec<Condition> {
    new.into_iter()
        .map(|mut condition| {
            let carried = previous
                .iter()
                .find(|p| p.condition_type == condition.condition_type)
                .filter(|p| p.status == condition.status)
                .and_then(|p| p.last_transition_time);
            condition.last_transition_time = Some(carried.unwrap_or(now));
            condition
        })
        .collect()
}
