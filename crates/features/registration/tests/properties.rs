use chrono::{DateTime, TimeZone, Utc};
use hostbind_domain::{Condition, ConditionStatus, ConditionType};
use hostbind_registration::merge_conditions;
use proptest::prelude::*;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600 + secs, 0).single().unwrap()
}

fn status() -> impl Strategy<Value = ConditionStatus> {
    prop_oneof![Just(ConditionStatus::True), Just(ConditionStatus::False), Just(ConditionStatus::Unknown)]
}

fn condition_type() -> impl Strategy<Value = ConditionType> {
    prop_oneof![Just(ConditionType::Accepted), Just(ConditionType::Verified)]
}

proptest! {
    #[test]
    fn merge_carries_time_only_for_unchanged_status(
        t in condition_type(),
        old in status(),
        new in status(),
        then in 0i64..1_000,
        now in 1_000i64..2_000,
    ) {
        let previous = [Condition { last_transition_time: Some(at(then)), ..Condition::new(t, old) }];
        let merged = merge_conditions(vec![Condition::new(t, new)], &previous, at(now));

        prop_assert_eq!(merged.len(), 1);
        let expected = if old == new { at(then) } else { at(now) };
        prop_assert_eq!(merged[0].last_transition_time, Some(expected));
        prop_assert_eq!(merged[0].status, new);
    }

    #[test]
    fn merge_is_stable_when_repeated(
        types in prop::sample::subsequence(vec![ConditionType::Accepted, ConditionType::Verified], 0..=2),
        statuses in prop::collection::vec(status(), 2),
        now in 0i64..1_000,
    ) {
        let new: Vec<Condition> = types.iter().zip(&statuses).map(|(t, s)| Condition::new(*t, *s)).collect();
        let once = merge_conditions(new.clone(), &[], at(now));
        let twice = merge_conditions(new, &once, at(now + 60));

        prop_assert_eq!(&once, &twice);
        let order: Vec<ConditionType> = once.iter().map(|c| c.condition_type).collect();
        prop_assert_eq!(order, types);
    }
}
