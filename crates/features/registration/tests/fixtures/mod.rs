#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use hostbind_domain::{
    DnsRecord, Domain, DomainRegistration, ObjectKey, ObjectReference, Resource,
};
use hostbind_events::EventBus;
use hostbind_kernel::{ResourceStore, StoreError};
use hostbind_registration::Reconciler;
use hostbind_store::MemoryStore;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FINALIZER: &str = "hostbind.io/domain-registration";
pub const OTHER_FINALIZER: &str = "example.com/keep";

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().unwrap_or_default()
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::builder().bus(EventBus::new()).clock(fixed_clock).build())
}

pub fn reconciler<S: ResourceStore>(store: Arc<S>) -> Reconciler<S> {
    Reconciler::builder().store(store).finalizer(FINALIZER).clock(fixed_clock).build()
}

pub fn registration(namespace: &str, name: &str, hostname: &str) -> DomainRegistration {
    DomainRegistration::new(namespace, name).with_hostname(hostname)
}

pub fn verified_domain(hostname: &str, key: &str) -> Domain {
    let mut domain = Domain::new(hostname);
    domain.spec.verification_key = Some(key.to_owned());
    domain.status.load_balancer.dns_records = vec![DnsRecord {
        name: hostname.to_owned(),
        record_type: "CNAME".to_owned(),
        value: "lb.hostbind.example".to_owned(),
    }];
    domain
}

pub async fn get_domain<S: ResourceStore>(store: &S, hostname: &str) -> Domain {
    store.get(&ObjectKey::cluster(hostname)).await.unwrap()
}

pub async fn get_registration<S: ResourceStore>(store: &S, key: &ObjectKey) -> DomainRegistration {
    store.get(key).await.unwrap()
}

/// Polls `check` until it holds or five seconds pass.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Store wrapper that fails `Domain` patches with conflicts.
///
/// When an interloper is set, the first injected conflict is a real one: the interloper is
/// bound to the domain behind the caller's back before its patch is applied.
pub struct ConflictingStore {
    pub inner: Arc<MemoryStore>,
    conflicts: AtomicU32,
    interloper: Mutex<Option<ObjectReference>>,
    pub domain_patches: AtomicU32,
}

impl ConflictingStore {
    pub fn new(inner: Arc<MemoryStore>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
            interloper: Mutex::new(None),
            domain_patches: AtomicU32::new(0),
        }
    }

    pub fn with_interloper(self, reference: ObjectReference) -> Self {
        *self.interloper.lock().unwrap() = Some(reference);
        self
    }

    fn take_conflict(&self) -> bool {
        self.conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ResourceStore for ConflictingStore {
    async fn get<R: Resource>(&self, key: &ObjectKey) -> Result<R, StoreError> {
        self.inner.get(key).await
    }

    async fn list<R: Resource>(&self) -> Result<Vec<R>, StoreError> {
        self.inner.list().await
    }

    async fn create<R: Resource>(&self, object: R) -> Result<R, StoreError> {
        self.inner.create(object).await
    }

    async fn patch<R: Resource>(&self, base: &R, mutated: &R) -> Result<R, StoreError> {
        if R::KIND != Domain::KIND {
            return self.inner.patch(base, mutated).await;
        }
        self.domain_patches.fetch_add(1, Ordering::SeqCst);
        if !self.take_conflict() {
            return self.inner.patch(base, mutated).await;
        }

        let interloper = self.interloper.lock().unwrap().take();
        let Some(interloper) = interloper else {
            let version = base.meta().resource_version;
            return Err(StoreError::conflict::<R>(&base.key(), version, version + 1));
        };

        let current: Domain = self.inner.get(&base.key()).await?;
        let mut raced = current.clone();
        raced.spec.registrations.push(interloper);
        self.inner.patch(&current, &raced).await?;
        self.inner.patch(base, mutated).await
    }

    async fn update_status<R: Resource>(&self, object: &R) -> Result<R, StoreError> {
        self.inner.update_status(object).await
    }

    async fn delete<R: Resource>(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.inner.delete::<R>(key).await
    }
}
