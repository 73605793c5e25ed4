use anyhow::{Context, Result};
use hostbind_domain::{Domain, DomainRegistration, Resource};
use hostbind_kernel::ResourceStore;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Objects applied to the store before the controller starts.
///
/// ```json
/// {
///   "domains": [{ "metadata": { "name": "acme.example" }, "spec": { "verificationKey": "k" } }],
///   "registrations": [{ "metadata": { "namespace": "ns", "name": "acme" },
///                       "spec": { "hostname": "acme.example" } }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedManifest {
    pub domains: Vec<Domain>,
    pub registrations: Vec<DomainRegistration>,
}

impl SeedManifest {
    /// Reads a manifest from a JSON file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or is not a valid manifest.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed manifest {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed seed manifest {}", path.display()))
    }

    /// Creates every object. Objects that already exist are skipped.
    ///
    /// Returns the number of objects created.
    ///
    /// # Errors
    /// Fails on the first store error other than an existing object.
    pub async fn apply<S: ResourceStore>(self, store: &S) -> Result<usize> {
        let mut created = 0;
        for domain in self.domains {
            created += usize::from(create(store, domain).await?);
        }
        for registration in self.registrations {
            created += usize::from(create(store, registration).await?);
        }
        info!(created, "Applied seed manifest");
        Ok(created)
    }
}

async fn create<S: ResourceStore, R: Resource>(store: &S, object: R) -> Result<bool> {
    let key = object.key();
    match store.create(object).await {
        Ok(_) => Ok(true),
        Err(hostbind_kernel::StoreError::AlreadyExists { .. }) => {
            warn!(kind = R::KIND, %key, "Seed object already exists, skipping");
            Ok(false)
        },
        Err(err) => Err(err).with_context(|| format!("Failed to seed {} {key}", R::KIND)),
    }
}
