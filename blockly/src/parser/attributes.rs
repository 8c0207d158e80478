/// Decoded attributes of one element, keyed by local name.
#[derive(Debug, Default)]
pub(crate) struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub(crate) fn push(&mut self, key: String, value: String) {
        self.pairs.push((key, value));
    }

    /// First attribute with the given local name.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The attribute's value, or `""` when absent.
    pub(crate) fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}
