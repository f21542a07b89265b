//! Admission key naming for the three quota scopes.

use std::fmt;

/// A key that uniquely identifies one (scope, scope-instance) pair whose
/// request history is tracked independently in the counter store.
///
/// The rendered form is part of the wire contract: any other implementation
/// pointed at the same store must produce byte-identical keys. Keys come
/// into existence on first evaluation and may be discarded by the store
/// once idle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdmissionKey {
    /// The system-wide scope shared by all traffic.
    Global,
    /// One resource (endpoint), all callers combined.
    Resource(String),
    /// One caller's share of one resource.
    Caller {
        /// The caller identifier
        caller: String,
        /// The resource identifier
        resource: String,
    },
}

impl AdmissionKey {
    /// Key for the resource scope of `resource_id`.
    pub fn resource(resource_id: impl Into<String>) -> Self {
        AdmissionKey::Resource(resource_id.into())
    }

    /// Key for `caller_id`'s share of `resource_id`.
    pub fn caller(caller_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        AdmissionKey::Caller {
            caller: caller_id.into(),
            resource: resource_id.into(),
        }
    }
}

impl fmt::Display for AdmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionKey::Global => write!(f, "rate_limit:global"),
            AdmissionKey::Resource(resource) => write!(f, "rate_limit:endpoint:{}", resource),
            AdmissionKey::Caller { caller, resource } => {
                write!(f, "rate_limit:user:{}:{}", caller, resource)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_key_rendering() {
        assert_eq!(AdmissionKey::Global.to_string(), "rate_limit:global");
    }

    #[test]
    fn test_resource_key_rendering() {
        let key = AdmissionKey::resource("/login");
        assert_eq!(key.to_string(), "rate_limit:endpoint:/login");
    }

    #[test]
    fn test_caller_key_rendering() {
        let key = AdmissionKey::caller("sanjay", "/login");
        assert_eq!(key.to_string(), "rate_limit:user:sanjay:/login");
    }

    #[test]
    fn test_key_equality() {
        assert_eq!(AdmissionKey::resource("/data"), AdmissionKey::resource("/data"));
        assert_ne!(
            AdmissionKey::caller("a", "/data"),
            AdmissionKey::caller("b", "/data")
        );
    }
}
