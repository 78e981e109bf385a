//! Ordered, case-insensitive header multimap shared by requests, responses,
//! default header sets and the transport sinks.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

/// Maximum inline header names before heap allocation.
/// Most requests and responses carry ≤16 distinct header names.
pub const MAX_INLINE_HEADERS: usize = 16;

/// One header name with all of its values, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: SmallVec<[String; 1]>,
}

/// Header multimap.
///
/// Names keep the spelling and position of their first insertion. Lookups are
/// case-insensitive per RFC 7230. Each name owns an ordered list of values, so
/// `X-A: 1` followed by `X-A: 2` is a single entry with two values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: SmallVec<[HeaderEntry; MAX_INLINE_HEADERS]>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Append a value, keeping any values already stored under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].values.push(value),
            None => {
                let mut values = SmallVec::new();
                values.push(value);
                self.entries.push(HeaderEntry { name, values });
            }
        }
    }

    /// Replace every value stored under `name` with `value`.
    ///
    /// An existing entry keeps its position; a new one goes last.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.values.clear();
                entry.values.push(value);
            }
            None => self.append(name, value),
        }
    }

    /// Remove `name` and return its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.position(name)?;
        Some(self.entries.remove(idx).values.into_vec())
    }

    /// First value stored under `name`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|idx| self.entries[idx].values.first())
            .map(String::as_str)
    }

    /// All values stored under `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(idx) => &self.entries[idx].values,
            None => &[],
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Iterate over every `(name, value)` pair, flattened.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.values
                .iter()
                .map(move |v| (e.name.as_str(), v.as_str()))
        })
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Serialized as `{ name: value }` for single values and `{ name: [values] }`
/// otherwise; used when a request is exposed to templates and diagnostics.
impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            if entry.values.len() == 1 {
                map.serialize_entry(&entry.name, &entry.values[0])?;
            } else {
                map.serialize_entry(&entry.name, entry.values.as_slice())?;
            }
        }
        map.end()
    }
}
