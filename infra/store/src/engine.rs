//! Core store implementation: versioned, serialized objects behind a single lock.

use crate::builder::StoreBuilder;
use chrono::{DateTime, Utc};
use fxhash::FxHashMap;
use hostbind_domain::{ObjectKey, ObjectMeta, Resource};
use hostbind_events::EventBus;
use hostbind_kernel::{ResourceStore, StoreError, StoreErrorExt, WatchEvent, safe_nanoid};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

type Bucket = BTreeMap<ObjectKey, Value>;

/// The internal shared state of a [`MemoryStore`].
#[derive(Debug)]
pub struct StoreInner {
    /// Serialized objects per kind, ordered by key.
    pub(crate) objects: RwLock<FxHashMap<&'static str, Bucket>>,
    pub(crate) bus: EventBus,
    pub(crate) clock: fn() -> DateTime<Utc>,
}

/// A thread-safe handle to the in-memory store.
///
/// This handle is internally reference-counted (`Arc`) and can be cheaply cloned
/// across tasks. All clones see the same objects.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl Deref for MemoryStore {
    type Target = StoreInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl MemoryStore {
    #[must_use = "The store is not usable until you call .build()"]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// The bus watch events are published on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Number of stored objects of the kind.
    #[must_use]
    pub fn count<R: Resource>(&self) -> usize {
        self.objects.read().get(R::KIND).map_or(0, BTreeMap::len)
    }

    fn publish<R: Resource>(&self, event: WatchEvent<R>) {
        if let Err(err) = self.bus.publish(event) {
            warn!(kind = R::KIND, error = %err, "Failed to publish watch event");
        }
    }
}

impl ResourceStore for MemoryStore {
    async fn get<R: Resource>(&self, key: &ObjectKey) -> Result<R, StoreError> {
        let value = self
            .objects
            .read()
            .get(R::KIND)
            .and_then(|bucket| bucket.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found::<R>(key))?;
        decode(value)
    }

    async fn list<R: Resource>(&self) -> Result<Vec<R>, StoreError> {
        let values: Vec<Value> = self
            .objects
            .read()
            .get(R::KIND)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default();
        values.into_iter().map(decode).collect()
    }

    async fn create<R: Resource>(&self, mut object: R) -> Result<R, StoreError> {
        validate_identity::<R>(object.meta())?;
        let key = object.key();

        {
            let mut objects = self.objects.write();
            let bucket = objects.entry(R::KIND).or_default();
            if bucket.contains_key(&key) {
                return Err(StoreError::already_exists::<R>(&key));
            }

            let meta = object.meta_mut();
            meta.uid = safe_nanoid!();
            meta.resource_version = 1;
            meta.generation = 1;
            meta.creation_timestamp = Some((self.clock)());
            meta.deletion_timestamp = None;

            bucket.insert(key.clone(), encode(&object)?);
        }

        debug!(kind = R::KIND, %key, uid = %object.meta().uid, "Created object");
        self.publish(WatchEvent::Applied(object.clone()));
        Ok(object)
    }

    async fn patch<R: Resource>(&self, base: &R, mutated: &R) -> Result<R, StoreError> {
        let key = base.key();
        if mutated.key() != key {
            return Err(StoreError::Internal {
                message: format!("Patch cannot move {key} to {}", mutated.key()).into(),
                context: Some(R::KIND.into()),
            });
        }

        let (stored, event) = {
            let mut objects = self.objects.write();
            let bucket = bucket_mut::<R>(&mut objects, &key)?;
            let current_value = bucket.get(&key).ok_or_else(|| StoreError::not_found::<R>(&key))?;
            let current: R = decode(current_value.clone())?;
            check_version::<R>(&key, base.meta(), current.meta())?;

            let mut next = mutated.clone();
            stamp_server_fields(next.meta_mut(), current.meta());
            let mut next_value = encode(&next)?;
            carry_status(&mut next_value, current_value);

            if next_value == *current_value {
                (current, None)
            } else {
                let spec_changed = next_value.get("spec") != current_value.get("spec");
                if spec_changed && R::IMMUTABLE_SPEC {
                    debug!(kind = R::KIND, %key, "Rejected spec change");
                    return Err(StoreError::immutable::<R>(&key, "spec"));
                }
                let mut next: R = decode(next_value)?;
                let meta = next.meta_mut();
                meta.resource_version += 1;
                meta.generation += u64::from(spec_changed);

                let event = commit(bucket, key.clone(), next)?;
                (event.object().clone(), Some(event))
            }
        };

        match event {
            Some(event) => {
                debug!(
                    kind = R::KIND,
                    %key,
                    resource_version = stored.meta().resource_version,
                    deleted = matches!(event, WatchEvent::Deleted(_)),
                    "Patched object"
                );
                self.publish(event);
            },
            None => debug!(kind = R::KIND, %key, "Patch is a no-op"),
        }
        Ok(stored)
    }

    async fn update_status<R: Resource>(&self, object: &R) -> Result<R, StoreError> {
        let key = object.key();

        let (stored, changed) = {
            let mut objects = self.objects.write();
            let bucket = bucket_mut::<R>(&mut objects, &key)?;
            let current_value = bucket.get(&key).ok_or_else(|| StoreError::not_found::<R>(&key))?;
            let current: R = decode(current_value.clone())?;
            check_version::<R>(&key, object.meta(), current.meta())?;

            let mut next_value = current_value.clone();
            carry_status(&mut next_value, &encode(object)?);
            if next_value == *current_value {
                (current, false)
            } else {
                let mut next: R = decode(next_value)?;
                next.meta_mut().resource_version += 1;
                bucket.insert(key.clone(), encode(&next)?);
                (next, true)
            }
        };

        if changed {
            debug!(
                kind = R::KIND,
                %key,
                resource_version = stored.meta().resource_version,
                "Updated status"
            );
            self.publish(WatchEvent::Applied(stored.clone()));
        }
        Ok(stored)
    }

    async fn delete<R: Resource>(&self, key: &ObjectKey) -> Result<(), StoreError> {
        let event = {
            let mut objects = self.objects.write();
            let bucket = bucket_mut::<R>(&mut objects, key)?;
            let current_value = bucket.get(key).ok_or_else(|| StoreError::not_found::<R>(key))?;
            let mut current: R = decode(current_value.clone())?;

            if current.meta().finalizers.is_empty() {
                bucket.remove(key);
                WatchEvent::Deleted(current)
            } else if current.meta().is_deleting() {
                return Ok(());
            } else {
                let meta = current.meta_mut();
                meta.deletion_timestamp = Some((self.clock)());
                meta.resource_version += 1;
                bucket.insert(key.clone(), encode(&current)?);
                WatchEvent::Applied(current)
            }
        };

        debug!(
            kind = R::KIND,
            %key,
            finalizers = ?event.object().meta().finalizers,
            removed = matches!(event, WatchEvent::Deleted(_)),
            "Deletion requested"
        );
        self.publish(event);
        Ok(())
    }
}

fn bucket_mut<'a, R: Resource>(
    objects: &'a mut FxHashMap<&'static str, Bucket>,
    key: &ObjectKey,
) -> Result<&'a mut Bucket, StoreError> {
    objects.get_mut(R::KIND).ok_or_else(|| StoreError::not_found::<R>(key))
}

/// Stores `next`, or removes it when it is deleting and no finalizer is left.
fn commit<R: Resource>(
    bucket: &mut Bucket,
    key: ObjectKey,
    next: R,
) -> Result<WatchEvent<R>, StoreError> {
    if next.meta().is_deleting() && next.meta().finalizers.is_empty() {
        bucket.remove(&key);
        return Ok(WatchEvent::Deleted(next));
    }
    bucket.insert(key, encode(&next)?);
    Ok(WatchEvent::Applied(next))
}

fn check_version<R: Resource>(
    key: &ObjectKey,
    expected: &ObjectMeta,
    actual: &ObjectMeta,
) -> Result<(), StoreError> {
    if expected.resource_version == actual.resource_version {
        return Ok(());
    }
    debug!(
        kind = R::KIND,
        %key,
        expected = expected.resource_version,
        actual = actual.resource_version,
        "Rejected stale write"
    );
    Err(StoreError::conflict::<R>(key, expected.resource_version, actual.resource_version))
}

/// Server-managed metadata always comes from the stored object.
fn stamp_server_fields(next: &mut ObjectMeta, current: &ObjectMeta) {
    next.uid.clone_from(&current.uid);
    next.creation_timestamp = current.creation_timestamp;
    next.deletion_timestamp = current.deletion_timestamp;
    next.resource_version = current.resource_version;
    next.generation = current.generation;
}

/// Copies the `status` member of `source` into `target`, removing it when absent.
fn carry_status(target: &mut Value, source: &Value) {
    let Value::Object(map) = target else {
        return;
    };
    match source.get("status") {
        Some(status) => {
            map.insert("status".to_owned(), status.clone());
        },
        None => {
            map.remove("status");
        },
    }
}

fn validate_identity<R: Resource>(meta: &ObjectMeta) -> Result<(), StoreError> {
    let problem = if meta.name.trim().is_empty() {
        Some("name must not be empty")
    } else if R::NAMESPACED && meta.namespace.as_deref().is_none_or(str::is_empty) {
        Some("namespaced kind requires a namespace")
    } else if !R::NAMESPACED && meta.namespace.is_some() {
        Some("cluster-scoped kind must not carry a namespace")
    } else {
        None
    };

    problem.map_or(Ok(()), |message| {
        Err(StoreError::Internal {
            message: message.into(),
            context: Some(format!("Creating {} '{}'", R::KIND, meta.key()).into()),
        })
    })
}

fn encode<R: Resource>(object: &R) -> Result<Value, StoreError> {
    serde_json::to_value(object).context(format!("Encoding {}", R::KIND))
}

fn decode<R: Resource>(value: Value) -> Result<R, StoreError> {
    serde_json::from_value(value).context(format!("Decoding {}", R::KIND))
}
