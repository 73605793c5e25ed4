use crate::condition::Condition;
use crate::meta::ObjectMeta;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// A request by some owner to bind a hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRegistration {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DomainRegistrationSpec,
    #[serde(default)]
    pub status: DomainRegistrationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainRegistrationSpec {
    /// Target hostname, fixed at creation. Falls back to the object name when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainRegistrationStatus {
    pub conditions: Vec<Condition>,
    /// Records the owner must publish for the binding to work and be verified.
    pub dns_records: Vec<DnsRecord>,
}

/// A DNS record as advertised by a load balancer or required for verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

impl DnsRecord {
    pub fn txt(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), record_type: "TXT".to_owned(), value: value.into() }
    }
}

impl DomainRegistration {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { metadata: ObjectMeta::namespaced(namespace, name), ..Self::default() }
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.spec.hostname = Some(hostname.into());
        self
    }

    /// Hostname this registration binds: `spec.hostname`, or the object name.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.spec.hostname.as_deref().unwrap_or(&self.metadata.name)
    }
}

impl Resource for DomainRegistration {
    const KIND: &'static str = "DomainRegistration";
    const NAMESPACED: bool = true;
    const IMMUTABLE_SPEC: bool = true;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
