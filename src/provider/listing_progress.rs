//! Utilities to track the sources that had to be skipped while listing items

use std::fmt::{Display, Error, Formatter};

/// A source that did not contribute to a listing
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedSource {
    pub uid: String,
    pub name: String,
    pub reason: String,
}

impl Display for SkippedSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "[{}] {}", self.name, self.reason)
    }
}


/// A structure that tracks the sources that are visited and skipped during a listing
#[derive(Debug, Default)]
pub struct ListingProgress {
    n_visited: u32,
    skipped: Vec<SkippedSource>,
}

impl ListingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every visited source has been listed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn n_visited(&self) -> u32 {
        self.n_visited
    }

    pub fn skipped(&self) -> &[SkippedSource] {
        &self.skipped
    }

    /// Record that a source is being listed
    pub fn visit(&mut self, name: &str) {
        self.n_visited += 1;
        log::debug!("Listing source {}", name);
    }

    /// Log a source that had to be skipped, and keep track of it
    pub fn skip(&mut self, uid: &str, name: &str, reason: &str) {
        let skipped = SkippedSource { uid: uid.to_string(), name: name.to_string(), reason: reason.to_string() };
        log::warn!("Skipping source {}", skipped);
        self.skipped.push(skipped);
    }

    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
}
