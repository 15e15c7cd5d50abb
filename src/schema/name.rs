/// A fully-qualified Avro name, e.g. `com.example.Foo`.
///
/// Stored pre-qualified (namespace already folded in) so lookups never need
/// to re-derive it; `namespace_delimiter_idx` remembers where the namespace
/// part ends so `.name()`/`.namespace()` don't re-split on every call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    fully_qualified_name: String,
    namespace_delimiter_idx: Option<usize>,
}

impl Name {
    pub fn from_fully_qualified_name(fully_qualified_name: String) -> Self {
        let namespace_delimiter_idx = fully_qualified_name.rfind('.');
        Self {
            fully_qualified_name,
            namespace_delimiter_idx,
        }
    }

    /// Qualifies `simple_name` using `enclosing_namespace` unless
    /// `simple_name` already contains a `.` (already fully qualified).
    pub fn qualify(simple_name: &str, enclosing_namespace: Option<&str>) -> Self {
        if simple_name.contains('.') {
            return Self::from_fully_qualified_name(simple_name.to_owned());
        }
        match enclosing_namespace {
            Some(ns) if !ns.is_empty() => {
                Self::from_fully_qualified_name(format!("{ns}.{simple_name}"))
            }
            _ => Self::from_fully_qualified_name(simple_name.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self.namespace_delimiter_idx {
            Some(idx) => &self.fully_qualified_name[idx + 1..],
            None => &self.fully_qualified_name,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace_delimiter_idx
            .map(|idx| &self.fully_qualified_name[..idx])
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fully_qualified_name
    }

    /// The namespace a nested definition should inherit from this name:
    /// this name's own namespace (not the simple name).
    pub fn child_namespace(&self) -> Option<&str> {
        self.namespace()
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fully_qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_simple_names() {
        let n = Name::qualify("Foo", Some("com.example"));
        assert_eq!(n.fully_qualified_name(), "com.example.Foo");
        assert_eq!(n.name(), "Foo");
        assert_eq!(n.namespace(), Some("com.example"));
    }

    #[test]
    fn leaves_already_qualified_names_alone() {
        let n = Name::qualify("com.example.Foo", Some("ignored"));
        assert_eq!(n.fully_qualified_name(), "com.example.Foo");
    }

    #[test]
    fn no_namespace() {
        let n = Name::qualify("Foo", None);
        assert_eq!(n.fully_qualified_name(), "Foo");
        assert_eq!(n.namespace(), None);
    }
}
