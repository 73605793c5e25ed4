//! Ownership verification through a DNS TXT record.

use crate::naming::{DnsNaming, NamingError};
use crate::tokens::TokenGenerator;
use hostbind_domain::condition::is_true;
use hostbind_domain::{ConditionType, DnsRecord, Domain, DomainRegistration};
use tracing::debug;

/// Publishes the records a registration's owner must serve and reports verification state.
#[derive(Debug)]
pub struct Verifier<'a, T, N> {
    tokens: &'a T,
    naming: &'a N,
}

impl<'a, T: TokenGenerator, N: DnsNaming> Verifier<'a, T, N> {
    pub const fn new(tokens: &'a T, naming: &'a N) -> Self {
        Self { tokens, naming }
    }

    /// Returns whether `registration` counts as verified for `domain`.
    ///
    /// Without a verification key on the domain this is `false` and the registration is left
    /// untouched. Otherwise `status.dns_records` becomes the domain's load balancer records
    /// followed by the TXT record carrying the token for this registration instance.
    ///
    /// A registration stays verified once its `Verified` condition is `True`; it is never
    /// re-checked against DNS.
    ///
    /// # Errors
    /// Returns [`NamingError`] when no record name can be formed for the domain's hostname.
    /// The registration is not modified in that case.
    pub fn verify(&self, domain: &Domain, registration: &mut DomainRegistration) -> Result<bool, NamingError> {
        let Some(key) = domain.spec.verification_key.as_deref() else {
            debug!(domain = domain.hostname(), "No verification key, skipping verification");
            return Ok(false);
        };

        let record_name = self.naming.record_name_for(domain.hostname())?;
        let token = self.tokens.derive_token(key, &registration.metadata.uid);

        let mut records = domain.status.load_balancer.dns_records.clone();
        records.push(DnsRecord::txt(record_name, token));
        registration.status.dns_records = records;

        Ok(is_true(&registration.status.conditions, ConditionType::Verified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::PrefixedRecordNaming;
    use crate::tokens::HkdfTokenGenerator;
    use hostbind_domain::{Condition, ConditionStatus};

    fn domain(key: Option<&str>) -> Domain {
        let mut domain = Domain::new("acme.example");
        domain.spec.verification_key = key.map(str::to_owned);
        domain.status.load_balancer.dns_records =
            vec![DnsRecord { name: "acme.example".into(), record_type: "A".into(), value: "192.0.2.1".into() }];
        domain
    }

    fn registration() -> DomainRegistration {
        let mut registration = DomainRegistration::new("ns", "acme").with_hostname("acme.example");
        registration.metadata.uid = "u1".into();
        registration
    }

    #[test]
    fn no_key_means_unverified_and_no_records() {
        let (tokens, naming) = (HkdfTokenGenerator, PrefixedRecordNaming::default());
        let mut reg = registration();
        assert!(!Verifier::new(&tokens, &naming).verify(&domain(None), &mut reg).unwrap());
        assert!(reg.status.dns_records.is_empty());
    }

    #[test]
    fn publishes_load_balancer_records_then_txt() {
        let (tokens, naming) = (HkdfTokenGenerator, PrefixedRecordNaming::default());
        let mut reg = registration();
        let verified = Verifier::new(&tokens, &naming).verify(&domain(Some("k")), &mut reg).unwrap();

        assert!(!verified);
        let records = &reg.status.dns_records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, "A");
        assert_eq!(records[1].name, "_hostbind-verification.acme.example");
        assert_eq!(records[1].record_type, "TXT");
        assert_eq!(records[1].value, HkdfTokenGenerator.derive_token("k", "u1"));
    }

    #[test]
    fn verified_stays_verified() {
        let (tokens, naming) = (HkdfTokenGenerator, PrefixedRecordNaming::default());
        let mut reg = registration();
        reg.status.conditions = vec![Condition::new(ConditionType::Verified, ConditionStatus::True)];
        assert!(Verifier::new(&tokens, &naming).verify(&domain(Some("k")), &mut reg).unwrap());
    }

    #[test]
    fn naming_failure_leaves_registration_untouched() {
        let naming = PrefixedRecordNaming::default();
        let tokens = HkdfTokenGenerator;
        let mut bad = domain(Some("k"));
        bad.metadata.name = "bad_host".into();
        let mut reg = registration();

        let err = Verifier::new(&tokens, &naming).verify(&bad, &mut reg).unwrap_err();
        assert_eq!(err.kind(), "InvalidHostname");
        assert!(reg.status.dns_records.is_empty());
    }
}
