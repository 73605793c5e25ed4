use crate::meta::{ObjectMeta, ObjectReference};
use crate::registration::DnsRecord;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// Canonical record of a hostname. The object name is the hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DomainSpec,
    #[serde(default)]
    pub status: DomainStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainSpec {
    /// Registrations currently bound to this hostname, in binding order.
    pub registrations: Vec<ObjectReference>,
    /// Key material for verification tokens. `None` disables verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainStatus {
    pub load_balancer: LoadBalancerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerStatus {
    pub dns_records: Vec<DnsRecord>,
}

impl Domain {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self { metadata: ObjectMeta::named(hostname), ..Self::default() }
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.metadata.name
    }
}

impl Resource for Domain {
    const KIND: &'static str = "Domain";
    const NAMESPACED: bool = false;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
