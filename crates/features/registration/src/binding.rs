//! Binding of registrations to the shared `Domain` object.
//!
//! `Domain.spec.registrations` is the only field written by more than one reconcile at a time,
//! so every write goes through the read-modify-write loop in [`DomainBinder`]: read a snapshot,
//! compute the new list from it, patch conditional on that snapshot and start over on conflict.

use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::references;
use hostbind_domain::{Domain, DomainRegistration, ObjectKey, ObjectReference, Resource};
use hostbind_kernel::ResourceStore;
use tracing::{debug, info, warn};

/// Outcome of one attempt of the read-modify-write loop.
enum Attempt<T> {
    Finished(T),
    Conflicted,
}

/// Adds and removes registration references on `Domain` objects.
#[derive(Debug)]
pub struct DomainBinder<'a, S> {
    store: &'a S,
    attempts: u32,
}

impl<'a, S: ResourceStore> DomainBinder<'a, S> {
    /// `attempts` bounds the conflict retries; zero is treated as one.
    pub fn new(store: &'a S, attempts: u32) -> Self {
        Self { store, attempts: attempts.max(1) }
    }

    /// Ensures the `Domain` named after the registration's hostname lists the registration.
    ///
    /// # Errors
    /// * [`RegistrationError::Store`] when a read, the creation or a patch fails. Losing a
    ///   creation race surfaces here as `AlreadyExists`; the next pass takes the patch path.
    /// * [`RegistrationError::ConflictRetriesExhausted`] when every patch attempt conflicted.
    pub async fn register(&self, registration: &DomainRegistration) -> Result<(), RegistrationError> {
        let key = ObjectKey::cluster(registration.hostname());
        let reference = registration.object_reference();

        self.with_retries(&key, || self.try_register(&key, &reference)).await
    }

    /// Removes the registration from its `Domain`.
    ///
    /// Returns whether the reference is still listed afterwards. A missing `Domain` or a
    /// missing reference is reported as `false`.
    ///
    /// # Errors
    /// Same as [`DomainBinder::register`], except that a missing `Domain` is not an error.
    pub async fn unregister(&self, registration: &DomainRegistration) -> Result<bool, RegistrationError> {
        let key = ObjectKey::cluster(registration.hostname());
        let reference = registration.object_reference();

        self.with_retries(&key, || self.try_unregister(&key, &reference)).await
    }

    async fn with_retries<T, F, Fut>(&self, key: &ObjectKey, mut attempt: F) -> Result<T, RegistrationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, RegistrationError>>,
    {
        for n in 1..=self.attempts {
            match attempt().await? {
                Attempt::Finished(value) => return Ok(value),
                Attempt::Conflicted => {
                    warn!(domain = %key, attempt = n, of = self.attempts, "Domain changed concurrently, retrying");
                },
            }
        }
        Err(RegistrationError::ConflictRetriesExhausted {
            key: key.to_string(),
            attempts: self.attempts,
            context: Some("Updating domain registrations".into()),
        })
    }

    async fn try_register(
        &self,
        key: &ObjectKey,
        reference: &ObjectReference,
    ) -> Result<Attempt<()>, RegistrationError> {
        let domain = match self.store.get::<Domain>(key).await {
            Ok(domain) => domain,
            Err(err) if err.is_not_found() => {
                let mut domain = Domain::new(key.name.clone());
                domain.spec.registrations = vec![reference.clone()];
                self.store.create(domain).await.context(format!("Creating domain {key}"))?;
                info!(domain = %key, registration = %reference.key(), "Created domain");
                return Ok(Attempt::Finished(()));
            },
            Err(err) => return Err(err).context(format!("Reading domain {key}")),
        };

        if references::contains(&domain.spec.registrations, reference) {
            debug!(domain = %key, registration = %reference.key(), "Already registered");
            return Ok(Attempt::Finished(()));
        }

        let mut mutated = domain.clone();
        mutated.spec.registrations = references::append_if_absent(&domain.spec.registrations, reference);
        match self.store.patch(&domain, &mutated).await {
            Ok(stored) => {
                info!(
                    domain = %key,
                    registration = %reference.key(),
                    registrations = stored.spec.registrations.len(),
                    "Registered"
                );
                Ok(Attempt::Finished(()))
            },
            Err(err) if err.is_conflict() => Ok(Attempt::Conflicted),
            Err(err) => Err(err).context(format!("Patching domain {key}")),
        }
    }

    async fn try_unregister(
        &self,
        key: &ObjectKey,
        reference: &ObjectReference,
    ) -> Result<Attempt<bool>, RegistrationError> {
        let domain = match self.store.get::<Domain>(key).await {
            Ok(domain) => domain,
            Err(err) if err.is_not_found() => {
                debug!(domain = %key, "Domain is gone, nothing to unregister");
                return Ok(Attempt::Finished(false));
            },
            Err(err) => return Err(err).context(format!("Reading domain {key}")),
        };

        if !references::contains(&domain.spec.registrations, reference) {
            debug!(domain = %key, registration = %reference.key(), "Not registered");
            return Ok(Attempt::Finished(false));
        }

        let mut mutated = domain.clone();
        mutated.spec.registrations = references::remove(&domain.spec.registrations, reference);
        match self.store.patch(&domain, &mutated).await {
            Ok(stored) => {
                let still_registered = references::contains(&stored.spec.registrations, reference);
                info!(
                    domain = %key,
                    registration = %reference.key(),
                    still_registered,
                    "Unregistered"
                );
                Ok(Attempt::Finished(still_registered))
            },
            Err(err) if err.is_conflict() => Ok(Attempt::Conflicted),
            Err(err) => Err(err).context(format!("Patching domain {key}")),
        }
    }
}
