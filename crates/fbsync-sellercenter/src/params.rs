//! Insertion-ordered request parameters.

/// Key under which the request signature travels.
pub const SIGNATURE_KEY: &str = "Signature";

/// Ordered string-to-string mapping sent with every Seller Center call.
///
/// Invariant: when present, `Signature` is the last pair. Changing any other
/// key after signing discards the stale signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    pairs: Vec<(String, String)>,
}

impl RequestParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an existing value in place.
    ///
    /// Inserting [`SIGNATURE_KEY`] behaves like [`RequestParameters::set_signature`].
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if key == SIGNATURE_KEY {
            self.set_signature(value);
            return;
        }

        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            if slot.1 != value {
                slot.1 = value;
                self.remove_signature();
            }
            return;
        }

        self.remove_signature();
        self.pairs.push((key, value));
    }

    /// Attaches the signature as the last pair, replacing any previous one.
    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.remove_signature();
        self.pairs.push((SIGNATURE_KEY.to_string(), signature.into()));
    }

    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get(SIGNATURE_KEY)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn remove_signature(&mut self) {
        self.pairs.retain(|(k, _)| k != SIGNATURE_KEY);
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
