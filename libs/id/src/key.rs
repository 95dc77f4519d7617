//! Cache keys for mirrored objects.

use std::fmt;

use crate::IdError;

/// Key of an object in a cache or lister.
///
/// Namespaced objects render as `<namespace>/<name>`, cluster-scoped objects
/// as `<name>`. Neither component may contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    namespace: Option<String>,
    name: String,
}

impl ObjectKey {
    /// Key for a namespaced object.
    ///
    /// Names and namespaces are validated upstream by the store; this does
    /// not re-check them.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Key for a cluster-scoped object.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Parses a key from its canonical string form.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let invalid = |message| IdError::InvalidKey {
            key: s.to_string(),
            message,
        };

        match s.split_once('/') {
            None => Ok(Self::cluster(s)),
            Some((namespace, name)) => {
                if namespace.is_empty() {
                    return Err(invalid("namespace is empty"));
                }
                if name.is_empty() {
                    return Err(invalid("name is empty"));
                }
                if name.contains('/') {
                    return Err(invalid("too many '/' separators"));
                }
                Ok(Self::namespaced(namespace, name))
            }
        }
    }

    /// The namespace, if the object is namespaced.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The object name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl std::str::FromStr for ObjectKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(ObjectKey::namespaced("default", "gpu-claim"), "default/gpu-claim")]
    #[case(ObjectKey::namespaced("team-a", "inference-0-gpu"), "team-a/inference-0-gpu")]
    #[case(ObjectKey::cluster("gpu.example.com"), "gpu.example.com")]
    fn test_key_display(#[case] key: ObjectKey, #[case] expected: &str) {
        assert_eq!(key.to_string(), expected);
        assert_eq!(ObjectKey::parse(expected).unwrap(), key);
    }

    #[rstest]
    #[case("/claim", "namespace is empty")]
    #[case("default/", "name is empty")]
    #[case("a/b/c", "too many '/' separators")]
    fn test_key_parse_rejects(#[case] input: &str, #[case] expected: &str) {
        match ObjectKey::parse(input).unwrap_err() {
            IdError::InvalidKey { message, .. } => assert_eq!(message, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_key_parse_empty() {
        assert!(ObjectKey::parse("").unwrap_err().is_empty());
    }

    proptest! {
        #[test]
        fn namespaced_keys_parse_back(ns in "[a-z0-9-]{1,20}", name in "[a-z0-9.-]{1,40}") {
            let key = ObjectKey::namespaced(ns.clone(), name.clone());
            let parsed = ObjectKey::parse(&key.to_string()).unwrap();
            prop_assert_eq!(parsed.namespace(), Some(ns.as_str()));
            prop_assert_eq!(parsed.name(), name.as_str());
        }
    }
}
