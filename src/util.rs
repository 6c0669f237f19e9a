//! Shared utility functions
//!
//! Small helpers used across the resolution and collector modules.

use indexmap::IndexMap;

/// Insertion-ordered map whose keys are folded to lower case.
///
/// # Examples
/// ```
/// use footprints::util::LowerCaseMap;
/// let mut map = LowerCaseMap::new();
/// map.insert("FooBar", 2);
/// assert_eq!(map.get("foobar"), Some(&2));
/// assert_eq!(map.get("FOOBAR"), Some(&2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LowerCaseMap<V> {
    inner: IndexMap<String, V>,
}

impl<V> Default for LowerCaseMap<V> {
    fn default() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }
}

impl<V> LowerCaseMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: V) -> Option<V> {
        self.inner.insert(key.as_ref().to_lowercase(), value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(&key.to_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(&key.to_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.inner.shift_remove(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for LowerCaseMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for LowerCaseMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Normalize a collector tag: lower case, trailing plural `s` removed.
///
/// # Examples
/// ```
/// use footprints::util::clean_tag;
/// assert_eq!(clean_tag("Containers"), "container");
/// assert_eq!(clean_tag("garbage"), "garbage");
/// ```
pub fn clean_tag(tag: &str) -> String {
    let lower = tag.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => lower,
    }
}

/// Check that a key is a plain identifier (`\w+`, not starting with a digit).
pub fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("garbage", "garbage")]
    #[case("Garbages", "garbage")]
    #[case(" KIND ", "kind")]
    #[case("s", "s")]
    fn test_clean_tag(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_tag(input), expected);
    }

    #[test]
    fn test_lower_case_map_overwrites_folded_keys() {
        let mut map: LowerCaseMap<i32> = [("Model", 1), ("geometry", 2)].into_iter().collect();
        assert_eq!(map.insert("MODEL", 3), Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["model", "geometry"]);
        assert_eq!(map.remove("Geometry"), Some(2));
        assert!(!map.contains_key("geometry"));
    }

    #[rstest]
    #[case("kind", true)]
    #[case("_hidden", true)]
    #[case("a1", true)]
    #[case("1a", false)]
    #[case("with-dash", false)]
    #[case("", false)]
    fn test_is_identifier(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(is_identifier(key), expected);
    }
}
