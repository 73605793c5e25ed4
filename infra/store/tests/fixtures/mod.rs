#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use hostbind_domain::{Domain, DomainRegistration};
use hostbind_events::EventBus;
use hostbind_store::MemoryStore;

pub const FINALIZER: &str = "hostbind.io/domain-registration";

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().unwrap_or_default()
}

pub fn store() -> MemoryStore {
    MemoryStore::builder().bus(EventBus::new()).clock(fixed_clock).build()
}

pub fn registration(namespace: &str, name: &str) -> DomainRegistration {
    DomainRegistration::new(namespace, name)
}

pub fn domain(hostname: &str) -> Domain {
    Domain::new(hostname)
}
