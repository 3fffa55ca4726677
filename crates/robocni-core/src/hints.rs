//! The ordered list of natural-language hints.

use std::path::Path;

use crate::error::{Result, RobocniError};

/// Non-empty, immutable list of hints. A hint's identity is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintSet {
    hints: Vec<String>,
}

impl HintSet {
    /// Build from lines of text; blank lines are dropped.
    pub fn from_lines<I, S>(lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hints: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if hints.is_empty() {
            None
        } else {
            Some(Self { hints })
        }
    }

    /// Load one hint per line from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_lines(content.lines())
            .ok_or_else(|| RobocniError::NoHints(path.display().to_string()))
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.hints.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hints.iter().map(String::as_str)
    }
}
