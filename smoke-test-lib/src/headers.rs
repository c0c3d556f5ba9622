//! Ordered, multi-valued response headers.

use crate::value::{Header, HeaderKey, HeaderValue};
use serde::Serialize;

/// Headers of one response in the order the transport delivered them.
///
/// Duplicate keys are kept (e.g. several `Set-Cookie` lines). Lookups are
/// case-insensitive on the key and return values as received.
///
/// [`HttpTransport`](crate::transport::HttpTransport) reads headers from a
/// `reqwest` header map, which groups repeated names together. Values of one
/// name keep their wire order, but the interleaving across different names
/// is lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderCollection {
    headers: Vec<Header>,
}

impl HeaderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from raw `(name, value)` pairs.
    ///
    /// Pairs that do not form a valid header are skipped and logged; one
    /// malformed header must not discard an otherwise usable response.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut collection = Self::new();
        for (key, value) in pairs {
            match HeaderKey::new(key).and_then(|k| Ok((k, HeaderValue::new(value)?))) {
                Ok((key, value)) => collection.add_header(Header::new(key, value)),
                Err(e) => tracing::warn!("Skipping response header: {}", e),
            }
        }
        collection
    }

    pub fn add_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|h| h.key().matches(key))
            .map(Header::value)
    }

    /// All values stored under `key`, in received order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.key().matches(key))
            .map(Header::value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.headers.iter().any(|h| h.key().matches(key))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl FromIterator<Header> for HeaderCollection {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        Self {
            headers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HeaderCollection {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}
