//! Content fingerprint of an assembled policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::policy::WhitelistPolicy;

/// SHA-256 over the canonical, sorted list of enrolled entries.
///
/// Entry order, duplicates and entries that failed to resolve do not affect
/// the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyFingerprint {
    pub hash: String,
    pub entries: usize,
}

impl PolicyFingerprint {
    pub fn compute(policy: &WhitelistPolicy) -> Self {
        let lines = canonical_entries(policy);

        let mut hasher = Sha256::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }

        Self {
            hash: hex::encode(hasher.finalize()),
            entries: lines.len(),
        }
    }

    /// First 16 hex characters.
    pub fn short(&self) -> &str {
        &self.hash[..16.min(self.hash.len())]
    }
}

impl std::fmt::Display for PolicyFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.hash)
    }
}

fn canonical_entries(policy: &WhitelistPolicy) -> BTreeSet<String> {
    let methods = policy
        .methods()
        .entries()
        .map(|(ty, sig)| format!("method {ty}.{sig}"));
    let constructors = policy
        .constructors()
        .entries()
        .map(|(ty, sig)| format!("constructor {ty}{sig}"));
    let fields = policy
        .fields()
        .entries()
        .map(|(ty, sig)| format!("field {ty}.{sig}"));
    methods.chain(constructors).chain(fields).collect()
}
