//! Ordered key/value collections for query, form, and header parameters.

/// Insertion-ordered parameter list.
///
/// [`Params::set`] replaces every existing value for a key in place;
/// [`Params::append`] adds another value after the existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Set `key` to a single `value`, keeping the key's original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut replaced = false;
        self.pairs.retain_mut(|(existing, slot)| {
            if *existing != key {
                return true;
            }
            if replaced {
                return false;
            }
            replaced = true;
            slot.clone_from(&value);
            true
        });
        if !replaced {
            self.pairs.push((key, value));
        }
    }

    /// Add another value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Whether no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Join pairs as `key=value` with `&`, transforming values with `encode`.
    pub(crate) fn join_with(&self, encode: impl Fn(&str) -> String) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn set_replaces_in_place() {
        let mut params: Params = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        params.set("a", "9");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "9"), ("b", "2")]);
    }

    #[rstest]
    fn join_keeps_insertion_order() {
        let params: Params = [("z", "last"), ("a", "first")].into_iter().collect();
        assert_eq!(params.join_with(str::to_owned), "z=last&a=first");
    }
}
