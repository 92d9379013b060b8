//! Ordered, duplicate-free error message list

use std::collections::HashSet;

/// Error messages in first-insertion order, each stored once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMessages {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl ErrorMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless an identical one is already present.
    /// Returns whether it was added.
    pub fn add<S: Into<String>>(&mut self, message: S) -> bool {
        let message = message.into();
        if self.seen.contains(&message) {
            return false;
        }
        self.seen.insert(message.clone());
        self.ordered.push(message);
        true
    }

    pub fn contains(&self, message: &str) -> bool {
        self.seen.contains(message)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.seen.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.ordered.iter()
    }
}

impl<'a> IntoIterator for &'a ErrorMessages {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

impl<S: Into<String>> Extend<S> for ErrorMessages {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for message in iter {
            self.add(message);
        }
    }
}
