/// Opaque survey columns carried through to the output untouched.
///
/// Keys are unique and keep the order in which they were first inserted.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passthrough {
    fields: Vec<(String, String)>,
}

impl Passthrough {
    /// An empty set of columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key`, or overwrites its value if it is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Passthrough {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut passthrough = Passthrough::new();
        for (k, v) in iter {
            passthrough.insert(k, v);
        }
        passthrough
    }
}

/// A validated privacy form row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyFormRecord {
    pub identifier: String,
    pub consent: bool,
    /// 0-based data row position in the privacy form file.
    pub row: usize,
}

/// A validated survey row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyRecord {
    pub identifier: String,
    pub passthrough: Passthrough,
    /// 0-based data row position in the survey file.
    pub row: usize,
}
