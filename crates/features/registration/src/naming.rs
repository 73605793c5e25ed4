//! Names of the DNS records an owner publishes to prove control of a hostname.

use std::borrow::Cow;

/// Default leftmost label of the verification record.
pub const DEFAULT_RECORD_PREFIX: &str = "_hostbind-verification";

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;

#[hostbind_derive::hostbind_error]
pub enum NamingError {
    #[error("Invalid hostname '{hostname}'{}: {reason}", format_context(.context))]
    InvalidHostname {
        hostname: String,
        reason: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },
}

/// Maps a hostname to the name of its verification TXT record.
pub trait DnsNaming: Send + Sync + 'static {
    /// # Errors
    /// Returns [`NamingError`] when no valid record name can be formed for `hostname`.
    fn record_name_for(&self, hostname: &str) -> Result<String, NamingError>;
}

/// Record name `<prefix>.<hostname>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedRecordNaming {
    prefix: String,
}

impl Default for PrefixedRecordNaming {
    fn default() -> Self {
        Self { prefix: DEFAULT_RECORD_PREFIX.to_owned() }
    }
}

impl PrefixedRecordNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl DnsNaming for PrefixedRecordNaming {
    fn record_name_for(&self, hostname: &str) -> Result<String, NamingError> {
        let hostname = normalize(hostname)?;
        let name = format!("{}.{hostname}", self.prefix);
        if name.len() > MAX_NAME_LEN {
            return Err(invalid(
                hostname,
                format!("record name exceeds {MAX_NAME_LEN} bytes"),
            ));
        }
        Ok(name)
    }
}

/// Validates `hostname` and returns it lowercased, without a trailing dot.
///
/// # Errors
/// Returns [`NamingError::InvalidHostname`] describing the first violated rule.
pub fn normalize(hostname: &str) -> Result<String, NamingError> {
    let trimmed = hostname.strip_suffix('.').unwrap_or(hostname);
    if trimmed.is_empty() {
        return Err(invalid(hostname, "hostname is empty"));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(invalid(hostname, format!("hostname exceeds {MAX_NAME_LEN} bytes")));
    }

    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(invalid(hostname, "empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid(
                hostname,
                format!("label '{label}' exceeds {MAX_LABEL_LEN} bytes"),
            ));
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(invalid(hostname, format!("label '{label}' has characters outside [a-z0-9-]")));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid(hostname, format!("label '{label}' starts or ends with '-'")));
        }
    }

    Ok(trimmed.to_ascii_lowercase())
}

fn invalid(hostname: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> NamingError {
    NamingError::InvalidHostname { hostname: hostname.into(), reason: reason.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> PrefixedRecordNaming {
        PrefixedRecordNaming::default()
    }

    #[test]
    fn prefixes_the_hostname() {
        assert_eq!(
            naming().record_name_for("acme.example").unwrap(),
            "_hostbind-verification.acme.example"
        );
        assert_eq!(PrefixedRecordNaming::new("_v").record_name_for("a.b").unwrap(), "_v.a.b");
    }

    #[test]
    fn tolerates_trailing_dot_and_case() {
        assert_eq!(
            naming().record_name_for("Acme.Example.").unwrap(),
            "_hostbind-verification.acme.example"
        );
    }

    #[test]
    fn rejects_invalid_hostnames() {
        let long_label = "a".repeat(64);
        let long_name = ["abcdefghij"; 22].join(".");
        for bad in ["", ".", "a..b", "-acme.example", "acme-.example", "ac_me.example", long_label.as_str()]
        {
            assert!(
                matches!(naming().record_name_for(bad), Err(NamingError::InvalidHostname { .. })),
                "expected '{bad}' to be rejected"
            );
        }
        assert!(normalize(&long_name).is_ok(), "{} bytes is a valid hostname", long_name.len());
        assert!(naming().record_name_for(&long_name).is_err(), "prefix pushes it past 253");
    }

    #[test]
    fn error_names_the_hostname() {
        let err = naming().record_name_for("bad_host").unwrap_err();
        assert!(err.to_string().starts_with("Invalid hostname 'bad_host'"));
    }
}
