//! HTTP header map with case-insensitive name lookup.
//!
//! HTTP header names are case-insensitive per [RFC 9110 §5.1]. The map keeps
//! one entry per name (compared ASCII case-insensitively) holding the name's
//! display casing and its ordered list of values.
//!
//! [RFC 9110 §5.1]: https://www.rfc-editor.org/rfc/rfc9110#section-5.1

use std::fmt;

/// Conversion into the value list of a header.
///
/// Lets header mutators accept a single value or a list of values.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| (*v).to_owned()).collect()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// A case-insensitive, multi-value HTTP header map.
///
/// Names keep their insertion order. [`set`](Self::set) replaces a header
/// and adopts the casing it was called with; [`append`](Self::append) keeps
/// the casing already stored.
///
/// # Examples
///
/// ```
/// use snapshot_http::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Content-Type", "text/html; charset=utf-8");
/// headers.append("X-Custom", "first");
/// headers.append("x-custom", "second");
///
/// assert_eq!(headers.get("content-type"), ["text/html; charset=utf-8"]);
/// assert_eq!(headers.line("X-CUSTOM"), "first, second");
/// assert_eq!(headers.names().collect::<Vec<_>>(), ["Content-Type", "X-Custom"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<HeaderEntry>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Replaces every value of `name` and remembers `name`'s casing.
    pub fn set(&mut self, name: impl Into<String>, values: impl IntoHeaderValues) {
        let name = name.into();
        let values = values.into_header_values();
        match self.position(&name) {
            Some(index) => self.entries[index] = HeaderEntry { name, values },
            None => self.entries.push(HeaderEntry { name, values }),
        }
    }

    /// Appends values to `name`, creating the header if it is absent.
    pub fn append(&mut self, name: impl Into<String>, values: impl IntoHeaderValues) {
        let name = name.into();
        let values = values.into_header_values();
        match self.position(&name) {
            Some(index) => self.entries[index].values.extend(values),
            None => self.entries.push(HeaderEntry { name, values }),
        }
    }

    /// Removes the header (case-insensitive).
    ///
    /// Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the header is present, even with no values.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of the header, empty if it is absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|index| self.entries[index].values.as_slice())
            .unwrap_or_default()
    }

    /// The values of the header joined with `", "`; empty if it is absent.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// Header names in their stored casing, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Returns the number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: IntoHeaderValues,
{
    /// Later names that match an earlier one replace it.
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.set(name, values);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}: {}\r\n", entry.name, entry.values.join(", "))?;
        }
        Ok(())
    }
}
