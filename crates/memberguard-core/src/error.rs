//! Error taxonomy for whitelist parsing, type resolution and policy loading.
//!
//! Two tiers matter: a [`SyntaxError`] is fatal for a whole whitelist batch,
//! while a [`ResolveError`] only disables the entry that caused it.

use std::path::PathBuf;

/// Why a whitelist entry was rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxReason {
    ForbiddenCharacters,
    MissingDot,
    MissingClosingParen,
    MalformedUpperBoundTypeName,
    MalformedMemberName,
    MalformedArgumentTypeName,
}

impl std::fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxReason::ForbiddenCharacters => {
                write!(f, "shouldn't contain \"<\", \">\", \"...\", or \";\"")
            }
            SyntaxReason::MissingDot => write!(f, "missing dot"),
            SyntaxReason::MissingClosingParen => write!(f, "missing closing ')'"),
            SyntaxReason::MalformedUpperBoundTypeName => {
                write!(f, "malformed upper bound type name")
            }
            SyntaxReason::MalformedMemberName => write!(f, "malformed member name"),
            SyntaxReason::MalformedArgumentTypeName => write!(f, "malformed argument type name"),
        }
    }
}

/// A whitelist entry that can never be valid, whatever types are available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed whitelist entry ({reason}): {entry}")]
pub struct SyntaxError {
    pub reason: SyntaxReason,
    /// The entry exactly as it was supplied.
    pub entry: String,
}

impl SyntaxError {
    pub fn new(reason: SyntaxReason, entry: impl Into<String>) -> Self {
        Self {
            reason,
            entry: entry.into(),
        }
    }
}

/// A type or member lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("type not found: {name}")]
    TypeNotFound { name: String },

    #[error("field not found: {owner}.{name}")]
    FieldNotFound { owner: String, name: String },

    #[error("method not found: {owner}.{signature}")]
    MethodNotFound { owner: String, signature: String },

    #[error("constructor not found: {owner}{signature}")]
    ConstructorNotFound { owner: String, signature: String },
}

/// Errors raised while assembling a [`crate::resolver::TypeCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("type declared twice: {0}")]
    DuplicateType(String),

    #[error("malformed type name: {0:?}")]
    MalformedTypeName(String),

    #[error("type {owner} references unknown type {missing}")]
    UnknownType { owner: String, missing: String },

    #[error("inheritance cycle involving: {}", .0.join(", "))]
    InheritanceCycle(Vec<String>),

    #[error("{0} cannot be used as a supertype")]
    InvalidSupertype(String),
}

/// Errors surfaced while loading a whitelist policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for policy loading operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
