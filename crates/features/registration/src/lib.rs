//! # Domain registrations
//!
//! Reconciles `DomainRegistration` objects against the cluster-scoped `Domain` objects that
//! record which registrations are bound to a hostname.
//!
//! A pass over a live registration:
//! 1. puts the finalizer in place (and stops, asking to be requeued, if it had to add it);
//! 2. binds the registration to the `Domain` named after its hostname, creating it on demand;
//! 3. publishes the verification TXT record next to the domain's load balancer records and
//!    reports the `Verified` condition.
//!
//! A pass over a deleting registration unbinds it, reports `Accepted` and releases the
//! finalizer once the `Domain` no longer lists it.
//!
//! [`Controller`] wires the [`Reconciler`] to store watch events and a worker pool.

mod binding;
mod conditions;
mod controller;
mod error;
mod finalizer;
mod naming;
mod reconciler;
mod references;
mod tokens;
mod verification;

pub use binding::DomainBinder;
pub use conditions::merge as merge_conditions;
pub use controller::{Controller, ControllerHandle};
pub use error::{RegistrationError, RegistrationErrorExt};
pub use finalizer::{ensure as ensure_finalizer, remove as remove_finalizer};
pub use naming::{DEFAULT_RECORD_PREFIX, DnsNaming, NamingError, NamingErrorExt, PrefixedRecordNaming, normalize};
pub use reconciler::{NoStore, ReconcileOutcome, Reconciler, ReconcilerBuilder, WithStore};
pub use references::{append_if_absent, contains, registration_identities_of, remove};
pub use tokens::{HkdfTokenGenerator, TOKEN_LEN, TokenGenerator};
pub use verification::Verifier;
