//! Parsed whitelist entries.

use std::fmt;

use crate::error::ResolveError;
use crate::model::{Constructor, Field, MemberKind, Method, TypeRef};

/// One whitelist entry after parsing and resolution.
///
/// Exactly one payload exists per selector. `Failure` carries an entry that
/// was well formed but referenced something the resolver could not find; the
/// policy logs and drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSelector {
    Method {
        upper_bound: TypeRef,
        method: Method,
    },
    Constructor {
        upper_bound: TypeRef,
        constructor: Constructor,
    },
    Field {
        upper_bound: TypeRef,
        field: Field,
    },
    Failure(ResolutionFailure),
}

impl MemberSelector {
    /// `None` for failures.
    pub fn kind(&self) -> Option<MemberKind> {
        match self {
            MemberSelector::Method { .. } => Some(MemberKind::Method),
            MemberSelector::Constructor { .. } => Some(MemberKind::Constructor),
            MemberSelector::Field { .. } => Some(MemberKind::Field),
            MemberSelector::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MemberSelector::Failure(_))
    }

    pub fn as_failure(&self) -> Option<&ResolutionFailure> {
        match self {
            MemberSelector::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A syntactically valid entry whose type or member could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// `None` when the upper bound type itself was missing.
    pub upper_bound: Option<TypeRef>,
    pub cause: ResolveError,
    /// The entry as it appeared in the whitelist.
    pub entry: String,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.cause)
    }
}
