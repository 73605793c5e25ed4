//! One reconcile pass over a single `DomainRegistration`.

use crate::binding::DomainBinder;
use crate::conditions;
use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::finalizer;
use crate::naming::{DnsNaming, PrefixedRecordNaming};
use crate::tokens::{HkdfTokenGenerator, TokenGenerator};
use crate::verification::Verifier;
use chrono::{DateTime, Utc};
use hostbind_domain::config::ControllerConfig;
use hostbind_domain::{Condition, ConditionStatus, ConditionType, Domain, DomainRegistration, ObjectKey};
use hostbind_kernel::ResourceStore;
use private::Sealed;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What the caller should do with the identity after a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing left to do until the next change.
    Done,
    /// The pass stopped early after a write; deliver the identity again right away.
    Requeue,
}

/// Drives a registration towards its desired state.
///
/// A pass reads the registration, keeps its finalizer in place, binds it to (or unbinds it
/// from) the `Domain` for its hostname, publishes verification records and persists the
/// resulting conditions. Passes are idempotent and hold no state between calls.
pub struct Reconciler<S, T = HkdfTokenGenerator, N = PrefixedRecordNaming> {
    store: Arc<S>,
    tokens: T,
    naming: N,
    finalizer: String,
    conflict_retries: u32,
    clock: fn() -> DateTime<Utc>,
}

impl<S, T, N> fmt::Debug for Reconciler<S, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("finalizer", &self.finalizer)
            .field("conflict_retries", &self.conflict_retries)
            .finish_non_exhaustive()
    }
}

impl Reconciler<()> {
    #[must_use = "The reconciler is not usable until you call .build()"]
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::default()
    }
}

impl<S, T, N> Reconciler<S, T, N>
where
    S: ResourceStore,
    T: TokenGenerator,
    N: DnsNaming,
{
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn finalizer(&self) -> &str {
        &self.finalizer
    }

    /// Runs one pass for the registration identified by `key`.
    ///
    /// A registration that no longer exists is not an error.
    ///
    /// # Errors
    /// Returns [`RegistrationError`] when a store operation of the pass failed. Status is not
    /// persisted in that case and the caller is expected to retry the identity later.
    #[instrument(skip_all, fields(registration = %key))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<ReconcileOutcome, RegistrationError> {
        let registration = match self.store.get::<DomainRegistration>(key).await {
            Ok(registration) => registration,
            Err(err) if err.is_not_found() => {
                debug!("Registration is gone, nothing to do");
                return Ok(ReconcileOutcome::Done);
            },
            Err(err) => return Err(err).context("Reading registration"),
        };

        let binder = DomainBinder::new(self.store.as_ref(), self.conflict_retries);
        let previous = registration.status.conditions.clone();

        let (mut registration, desired, removable) = if registration.metadata.is_deleting() {
            let (accepted, removable) = match binder.unregister(&registration).await {
                Ok(still_registered) => {
                    (Condition::new(ConditionType::Accepted, still_registered.into()), !still_registered)
                },
                Err(err) => {
                    warn!(error = %err, kind = err.kind(), "Failed to unregister, keeping finalizer");
                    (unknown(ConditionType::Accepted, &err), false)
                },
            };
            (registration, accepted, removable)
        } else {
            let (registration, added) = finalizer::ensure(self.store.as_ref(), registration, &self.finalizer)
                .await
                .context("Adding finalizer")?;
            if added {
                info!(finalizer = %self.finalizer, "Added finalizer");
                return Ok(ReconcileOutcome::Requeue);
            }

            binder.register(&registration).await?;

            let mut registration = registration;
            let verified = self.verified_condition(&mut registration).await;
            (registration, verified, false)
        };

        registration.status.conditions = conditions::merge(vec![desired], &previous, (self.clock)());
        let stored = self
            .store
            .update_status(&registration)
            .await
            .context("Updating registration status")?;

        if removable {
            finalizer::remove(self.store.as_ref(), &stored, &self.finalizer)
                .await
                .context("Removing finalizer")?;
            info!(finalizer = %self.finalizer, "Released registration");
        }

        debug!(conditions = ?stored.status.conditions, "Reconciled");
        Ok(ReconcileOutcome::Done)
    }

    /// The `Verified` condition for this pass. Publishes DNS records on the registration.
    async fn verified_condition(&self, registration: &mut DomainRegistration) -> Condition {
        let key = ObjectKey::cluster(registration.hostname());
        let domain = match self.store.get::<Domain>(&key).await {
            Ok(domain) => domain,
            Err(err) if err.is_not_found() => {
                debug!(domain = %key, "Domain not found, reporting unverified");
                return Condition::new(ConditionType::Verified, ConditionStatus::False);
            },
            Err(err) => {
                let err = RegistrationError::from(err);
                warn!(domain = %key, error = %err, "Failed to read domain for verification");
                return unknown(ConditionType::Verified, &err);
            },
        };

        match Verifier::new(&self.tokens, &self.naming).verify(&domain, registration) {
            Ok(verified) => Condition::new(ConditionType::Verified, verified.into()),
            Err(err) => {
                let err = RegistrationError::from(err);
                warn!(domain = %key, error = %err, "Verification failed");
                unknown(ConditionType::Verified, &err)
            },
        }
    }
}

fn unknown(condition_type: ConditionType, err: &RegistrationError) -> Condition {
    Condition::new(condition_type, ConditionStatus::Unknown).with_message(err.to_string())
}

// --- Builder ---

#[derive(Debug, Default)]
pub struct NoStore;
pub struct WithStore<S>(Arc<S>);

impl<S> fmt::Debug for WithStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WithStore")
    }
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoStore {}
impl<S> Sealed for WithStore<S> {}

/// Typestate builder for [`Reconciler`]. A store must be set before `build`.
#[allow(private_bounds)]
#[derive(Debug)]
pub struct ReconcilerBuilder<St: Sealed = NoStore, T = HkdfTokenGenerator, N = PrefixedRecordNaming> {
    state: St,
    tokens: T,
    naming: N,
    finalizer: String,
    conflict_retries: u32,
    clock: fn() -> DateTime<Utc>,
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        let runtime = hostbind_domain::config::RuntimeConfig::default();
        Self {
            state: NoStore,
            tokens: HkdfTokenGenerator,
            naming: PrefixedRecordNaming::default(),
            finalizer: runtime.finalizer,
            conflict_retries: runtime.conflict_retries,
            clock: Utc::now,
        }
    }
}

#[allow(private_bounds)]
impl<St: Sealed, T, N> ReconcilerBuilder<St, T, N> {
    #[must_use = "Sets the finalizer marker placed on registrations"]
    pub fn finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.finalizer = finalizer.into();
        self
    }

    #[must_use = "Sets the attempts of the domain read-modify-write loop"]
    pub const fn conflict_retries(mut self, attempts: u32) -> Self {
        self.conflict_retries = attempts;
        self
    }

    /// Overrides the source of condition transition times.
    #[must_use = "Sets the clock used for condition transition times"]
    pub const fn clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Applies the runtime and verification sections of the configuration.
    #[must_use = "Applies the controller configuration"]
    pub fn from_config(self, config: &ControllerConfig) -> ReconcilerBuilder<St, T, PrefixedRecordNaming> {
        ReconcilerBuilder {
            state: self.state,
            tokens: self.tokens,
            naming: PrefixedRecordNaming::new(config.verification.record_prefix.clone()),
            finalizer: config.controller.finalizer.clone(),
            conflict_retries: config.controller.conflict_retries,
            clock: self.clock,
        }
    }

    #[must_use = "Sets the verification token generator"]
    pub fn token_generator<T2: TokenGenerator>(self, tokens: T2) -> ReconcilerBuilder<St, T2, N> {
        ReconcilerBuilder {
            state: self.state,
            tokens,
            naming: self.naming,
            finalizer: self.finalizer,
            conflict_retries: self.conflict_retries,
            clock: self.clock,
        }
    }

    #[must_use = "Sets the verification record naming"]
    pub fn naming<N2: DnsNaming>(self, naming: N2) -> ReconcilerBuilder<St, T, N2> {
        ReconcilerBuilder {
            state: self.state,
            tokens: self.tokens,
            naming,
            finalizer: self.finalizer,
            conflict_retries: self.conflict_retries,
            clock: self.clock,
        }
    }
}

impl<T, N> ReconcilerBuilder<NoStore, T, N> {
    #[must_use = "Sets the store the reconciler reads and writes"]
    pub fn store<S: ResourceStore>(self, store: Arc<S>) -> ReconcilerBuilder<WithStore<S>, T, N> {
        ReconcilerBuilder {
            state: WithStore(store),
            tokens: self.tokens,
            naming: self.naming,
            finalizer: self.finalizer,
            conflict_retries: self.conflict_retries,
            clock: self.clock,
        }
    }
}

impl<S, T, N> ReconcilerBuilder<WithStore<S>, T, N>
where
    S: ResourceStore,
    T: TokenGenerator,
    N: DnsNaming,
{
    #[must_use]
    pub fn build(self) -> Reconciler<S, T, N> {
        debug!(finalizer = %self.finalizer, conflict_retries = self.conflict_retries, "Built reconciler");
        Reconciler {
            store: self.state.0,
            tokens: self.tokens,
            naming: self.naming,
            finalizer: self.finalizer,
            conflict_retries: self.conflict_retries,
            clock: self.clock,
        }
    }
}
