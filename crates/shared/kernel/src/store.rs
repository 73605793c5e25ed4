//! Port to the resource store.
//!
//! The reconciler only ever talks to the store through [`ResourceStore`]; the in-memory
//! implementation lives in `hostbind-store`, and tests can provide their own.

use hostbind_domain::{ObjectKey, Resource};
use std::borrow::Cow;

#[hostbind_derive::hostbind_error]
pub enum StoreError {
    #[error("{kind} '{key}' not found{}", format_context(.context))]
    NotFound { kind: &'static str, key: String, context: Option<Cow<'static, str>> },

    /// The write was computed against a stale `resource_version`.
    #[error(
        "Conflict on {kind} '{key}'{}: expected resource version {expected}, found {actual}",
        format_context(.context)
    )]
    Conflict {
        kind: &'static str,
        key: String,
        expected: u64,
        actual: u64,
        context: Option<Cow<'static, str>>,
    },

    #[error("{kind} '{key}' already exists{}", format_context(.context))]
    AlreadyExists { kind: &'static str, key: String, context: Option<Cow<'static, str>> },

    /// The write changed a field that is fixed once the object exists.
    #[error("{kind} '{key}' cannot change its {field}{}", format_context(.context))]
    Immutable {
        kind: &'static str,
        key: String,
        field: &'static str,
        context: Option<Cow<'static, str>>,
    },

    #[error("Serialization failure{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Internal store error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl StoreError {
    pub fn not_found<R: Resource>(key: &ObjectKey) -> Self {
        Self::NotFound { kind: R::KIND, key: key.to_string(), context: None }
    }

    pub fn already_exists<R: Resource>(key: &ObjectKey) -> Self {
        Self::AlreadyExists { kind: R::KIND, key: key.to_string(), context: None }
    }

    pub fn immutable<R: Resource>(key: &ObjectKey, field: &'static str) -> Self {
        Self::Immutable { kind: R::KIND, key: key.to_string(), field, context: None }
    }

    pub fn conflict<R: Resource>(key: &ObjectKey, expected: u64, actual: u64) -> Self {
        Self::Conflict { kind: R::KIND, key: key.to_string(), expected, actual, context: None }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Change notification published by a store for every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent<R> {
    /// The object was created or updated; carries the stored state.
    Applied(R),
    /// The object is gone; carries its last state.
    Deleted(R),
}

impl<R: Resource> WatchEvent<R> {
    pub const fn object(&self) -> &R {
        match self {
            Self::Applied(object) | Self::Deleted(object) => object,
        }
    }
}

/// Typed access to stored resources with optimistic concurrency.
///
/// Every write that takes an existing object succeeds only when the object's
/// `resource_version` matches the stored one, and returns the stored result with the
/// bumped version.
pub trait ResourceStore: Send + Sync + 'static {
    /// Reads the current state of an object.
    fn get<R: Resource>(
        &self,
        key: &ObjectKey,
    ) -> impl Future<Output = Result<R, StoreError>> + Send;

    /// Returns every object of the kind, ordered by key.
    fn list<R: Resource>(&self) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;

    /// Persists a new object. Fails with `AlreadyExists` when the key is taken.
    fn create<R: Resource>(&self, object: R) -> impl Future<Output = Result<R, StoreError>> + Send;

    /// Applies the changes made from `base` to `mutated`, conditional on `base` being current.
    ///
    /// Status and server-managed metadata are never changed through a patch.
    fn patch<R: Resource>(
        &self,
        base: &R,
        mutated: &R,
    ) -> impl Future<Output = Result<R, StoreError>> + Send;

    /// Replaces only the status of the object.
    fn update_status<R: Resource>(
        &self,
        object: &R,
    ) -> impl Future<Output = Result<R, StoreError>> + Send;

    /// Requests deletion. Objects holding finalizers are only marked as deleting.
    fn delete<R: Resource>(
        &self,
        key: &ObjectKey,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
