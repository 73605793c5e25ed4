use hostbind_domain::{
    Condition, ConditionStatus, ConditionType, DnsRecord, Domain, DomainRegistration, Resource,
};
use serde_json::json;

#[test]
fn registration_hostname_falls_back_to_name() {
    let plain = DomainRegistration::new("ns", "acme.example");
    assert_eq!(plain.hostname(), "acme.example");

    let explicit = DomainRegistration::new("ns", "acme").with_hostname("acme.example");
    assert_eq!(explicit.hostname(), "acme.example");
}

#[test]
fn object_reference_carries_kind_and_identity() {
    let mut reg = DomainRegistration::new("ns", "acme");
    reg.metadata.uid = "u1".to_owned();

    let reference = reg.object_reference();
    assert_eq!(reference.kind, "DomainRegistration");
    assert_eq!(reference.api_version, hostbind_domain::API_VERSION);
    assert_eq!(reference.namespace.as_deref(), Some("ns"));
    assert_eq!(reference.uid, "u1");
    assert_eq!(reference.key(), reg.key());
}

#[test]
fn registration_uses_camel_case_wire_names() {
    let mut reg = DomainRegistration::new("ns", "acme");
    reg.status.dns_records.push(DnsRecord::txt("_v.acme", "token"));
    reg.status.conditions.push(Condition::new(ConditionType::Verified, ConditionStatus::False));

    let value = serde_json::to_value(&reg).expect("serialize");
    assert_eq!(value["status"]["dnsRecords"][0]["type"], "TXT");
    assert_eq!(value["status"]["conditions"][0]["type"], "Verified");
    assert_eq!(value["status"]["conditions"][0]["status"], "False");
    assert_eq!(value["metadata"]["namespace"], "ns");
}

#[test]
fn domain_deserializes_from_manifest_shape() {
    let raw = json!({
        "metadata": { "name": "acme.example" },
        "spec": {
            "verificationKey": "k",
            "registrations": [
                { "apiVersion": "hostbind.io/v1beta1", "kind": "DomainRegistration",
                  "namespace": "ns", "name": "acme", "uid": "u1" }
            ]
        },
        "status": { "loadBalancer": { "dnsRecords": [
            { "name": "acme.example", "type": "A", "value": "10.0.0.1" }
        ] } }
    });

    let domain: Domain = serde_json::from_value(raw).expect("deserialize");
    assert_eq!(domain.hostname(), "acme.example");
    assert_eq!(domain.spec.verification_key.as_deref(), Some("k"));
    assert_eq!(domain.spec.registrations.len(), 1);
    assert_eq!(domain.status.load_balancer.dns_records[0].record_type, "A");
    assert!(!Domain::NAMESPACED);
}
