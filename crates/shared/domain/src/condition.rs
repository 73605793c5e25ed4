use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Tri-state status of a condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Condition types tracked on a `DomainRegistration`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ConditionType {
    /// The registration is bound to its `Domain`. Reported only while deleting.
    Accepted,
    /// Ownership of the hostname was proven through the DNS TXT record.
    Verified,
}

/// A single status condition. At most one per [`ConditionType`] in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    /// A condition without a transition time; the merge step stamps it.
    #[must_use]
    pub const fn new(condition_type: ConditionType, status: ConditionStatus) -> Self {
        Self { condition_type, status, last_transition_time: None, message: String::new() }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Looks up the condition of the given type.
#[must_use]
pub fn find(conditions: &[Condition], condition_type: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}

/// `true` when a condition of this type exists with status `True`.
#[must_use]
pub fn is_true(conditions: &[Condition], condition_type: ConditionType) -> bool {
    find(conditions, condition_type).is_some_and(|c| c.status == ConditionStatus::True)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_bool() {
        assert_eq!(ConditionStatus::from(true), ConditionStatus::True);
        assert_eq!(ConditionStatus::from(false), ConditionStatus::False);
    }

    #[test]
    fn status_and_type_round_trip_as_strings() {
        assert_eq!(ConditionStatus::Unknown.to_string(), "Unknown");
        assert_eq!("Verified".parse::<ConditionType>().ok(), Some(ConditionType::Verified));
        assert_eq!(ConditionType::Accepted.as_ref(), "Accepted");
    }

    #[test]
    fn lookup_helpers() {
        let conditions = vec![
            Condition::new(ConditionType::Verified, ConditionStatus::True),
            Condition::new(ConditionType::Accepted, ConditionStatus::Unknown).with_message("boom"),
        ];
        assert!(is_true(&conditions, ConditionType::Verified));
        assert!(!is_true(&conditions, ConditionType::Accepted));
        assert_eq!(find(&conditions, ConditionType::Accepted).map(|c| c.message.as_str()), Some("boom"));
    }
}
