//! # Domain Models
//!
//! Pure resource types shared by the store, the reconciler and the controller binary.
//! Keep it lean: no I/O or networking, just data and small helpers.
//!
//! Two resources are modelled:
//! * [`DomainRegistration`] (namespaced): an owner's request to bind a hostname.
//! * [`Domain`] (cluster scoped): the canonical record of a hostname and the
//!   registrations currently bound to it.

pub mod condition;
pub mod config;
pub mod domain;
pub mod meta;
pub mod registration;
pub mod resource;

pub use condition::{Condition, ConditionStatus, ConditionType};
pub use domain::{Domain, DomainSpec, DomainStatus, LoadBalancerStatus};
pub use meta::{ObjectKey, ObjectMeta, ObjectReference};
pub use registration::{DnsRecord, DomainRegistration, DomainRegistrationSpec, DomainRegistrationStatus};
pub use resource::Resource;

/// API group/version shared by both resources.
pub const API_VERSION: &str = "hostbind.io/v1beta1";
