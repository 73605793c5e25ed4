//! Set operations over object references.
//!
//! Membership is decided by `(namespace, name, uid)`; kind and API version are ignored,
//! so a re-created object with the same name is a different member.

use hostbind_domain::{Domain, ObjectKey, ObjectReference};

#[must_use]
pub fn contains(set: &[ObjectReference], reference: &ObjectReference) -> bool {
    set.iter().any(|r| r.same_object(reference))
}

/// Returns `set` with `reference` appended, or unchanged if it is already a member.
#[must_use]
pub fn append_if_absent(set: &[ObjectReference], reference: &ObjectReference) -> Vec<ObjectReference> {
    let mut out = set.to_vec();
    if !contains(set, reference) {
        out.push(reference.clone());
    }
    out
}

/// Returns `set` without any member matching `reference`.
#[must_use]
pub fn remove(set: &[ObjectReference], reference: &ObjectReference) -> Vec<ObjectReference> {
    set.iter().filter(|r| !r.same_object(reference)).cloned().collect()
}

/// Registration identities to re-deliver when `domain` changes.
#[must_use]
pub fn registration_identities_of(domain: &Domain) -> Vec<ObjectKey> {
    domain.spec.registrations.iter().map(ObjectReference::key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference(namespace: &str, name: &str, uid: &str) -> ObjectReference {
        ObjectReference {
            api_version: hostbind_domain::API_VERSION.to_owned(),
            kind: "DomainRegistration".to_owned(),
            namespace: Some(namespace.to_owned()),
            name: name.to_owned(),
            uid: uid.to_owned(),
        }
    }

    fn arb_reference() -> impl Strategy<Value = ObjectReference> {
        ("[ab]", "[xy]", "u[12]").prop_map(|(ns, name, uid)| reference(&ns, &name, &uid))
    }

    proptest! {
        #[test]
        fn appended_reference_is_contained(
            set in prop::collection::vec(arb_reference(), 0..6),
            r in arb_reference(),
        ) {
            prop_assert!(contains(&append_if_absent(&set, &r), &r));
        }

        #[test]
        fn append_is_idempotent_and_never_reorders(
            set in prop::collection::vec(arb_reference(), 0..6),
            r in arb_reference(),
        ) {
            let once = append_if_absent(&set, &r);
            let twice = append_if_absent(&once, &r);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(&once[..set.len()], &set[..]);
        }

        #[test]
        fn remove_is_idempotent_and_complete(
            set in prop::collection::vec(arb_reference(), 0..6),
            r in arb_reference(),
        ) {
            let once = remove(&set, &r);
            prop_assert!(!contains(&once, &r));
            prop_assert_eq!(remove(&once, &r), once);
        }
    }

    #[test]
    fn membership_ignores_kind() {
        let set = vec![reference("ns", "acme", "u1")];
        let other_kind = ObjectReference { kind: "Other".into(), ..reference("ns", "acme", "u1") };
        assert!(contains(&set, &other_kind));
        assert!(!contains(&set, &reference("ns", "acme", "u2")));
    }

    #[test]
    fn fan_out_lists_every_registration() {
        let mut domain = Domain::new("acme.example");
        domain.spec.registrations = vec![reference("a", "x", "u1"), reference("b", "y", "u2")];
        assert_eq!(
            registration_identities_of(&domain),
            vec![ObjectKey::namespaced("a", "x"), ObjectKey::namespaced("b", "y")]
        );
        assert!(registration_identities_of(&Domain::new("empty.example")).is_empty());
    }
}
