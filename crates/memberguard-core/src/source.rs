//! Whitelist sources: raw entries as they are stored on disk.
//!
//! One entry per line. Blank lines and lines whose first non-blank character
//! is `#` are skipped; everything else is handed to the parser verbatim.

use std::path::Path;

use crate::error::{PolicyError, Result};
use crate::policy::WhitelistPolicy;
use crate::resolver::TypeResolver;

/// Ordered raw whitelist entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistSource {
    entries: Vec<String>,
}

impl WhitelistSource {
    pub fn parse_text(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse_text(&text);
        tracing::debug!(path = %path.display(), entries = source.len(), "whitelist loaded");
        Ok(source)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse every entry against `resolver` and build the policy.
    pub fn build_policy<R>(&self, resolver: &R) -> Result<WhitelistPolicy>
    where
        R: TypeResolver + ?Sized,
    {
        Ok(WhitelistPolicy::from_entries(&self.entries, resolver)?)
    }
}

impl<S: Into<String>> FromIterator<S> for WhitelistSource {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}
