use crate::meta::{ObjectKey, ObjectMeta, ObjectReference};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Common surface of every stored resource kind.
///
/// The store keys objects by `(KIND, key())` and uses the metadata accessors for
/// versioning, finalizers and deletion bookkeeping.
pub trait Resource: Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;
    const API_VERSION: &'static str = crate::API_VERSION;
    const NAMESPACED: bool;
    /// Rejects patches that change `spec` after creation.
    const IMMUTABLE_SPEC: bool = false;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn key(&self) -> ObjectKey {
        self.meta().key()
    }

    /// Reference to this object instance, suitable for ownership lists.
    fn object_reference(&self) -> ObjectReference {
        let meta = self.meta();
        ObjectReference {
            api_version: Self::API_VERSION.to_owned(),
            kind: Self::KIND.to_owned(),
            namespace: meta.namespace.clone(),
            name: meta.name.clone(),
            uid: meta.uid.clone(),
        }
    }
}
