//! Finalizer bookkeeping through the store.

use hostbind_domain::Resource;
use hostbind_kernel::{ResourceStore, StoreError};
use tracing::debug;

/// Adds `marker` to the object's finalizers.
///
/// Returns the stored object and whether a write happened. An object that already carries
/// the marker is returned unchanged without touching the store.
///
/// # Errors
/// Propagates the store error of the patch, including conflicts.
pub async fn ensure<S, R>(store: &S, object: R, marker: &str) -> Result<(R, bool), StoreError>
where
    S: ResourceStore,
    R: Resource,
{
    if object.meta().has_finalizer(marker) {
        return Ok((object, false));
    }
    let mut mutated = object.clone();
    mutated.meta_mut().add_finalizer(marker);
    let stored = store.patch(&object, &mutated).await?;
    debug!(kind = R::KIND, key = %stored.key(), marker, "Added finalizer");
    Ok((stored, true))
}

/// Removes `marker` from the object's finalizers. Returns `false` when it was not present.
///
/// Removing the last finalizer of a deleting object lets the store drop it.
///
/// # Errors
/// Propagates the store error of the patch, including conflicts.
pub async fn remove<S, R>(store: &S, object: &R, marker: &str) -> Result<bool, StoreError>
where
    S: ResourceStore,
    R: Resource,
{
    if !object.meta().has_finalizer(marker) {
        return Ok(false);
    }
    let mut mutated = object.clone();
    mutated.meta_mut().remove_finalizer(marker);
    store.patch(object, &mutated).await?;
    debug!(kind = R::KIND, key = %object.key(), marker, "Removed finalizer");
    Ok(true)
}
