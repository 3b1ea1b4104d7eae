//! Subtype-aware member registries.
//!
//! A registry records `(upper bound, signature)` pairs. A query for a
//! concrete type matches when the signature was enrolled against that type or
//! any of its supertypes, never the other way round: an entry enrolled on a
//! subclass stays invisible on the superclass even when the superclass
//! declares the very same member.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::model::{ConstructorSignature, FieldSignature, MethodSignature, TypeRef};

pub type MethodRegistry = MemberRegistry<MethodSignature>;
pub type ConstructorRegistry = MemberRegistry<ConstructorSignature>;
pub type FieldRegistry = MemberRegistry<FieldSignature>;

/// Upper bound types enrolled for one signature.
#[derive(Debug, Clone, Default)]
struct UpperBounds {
    types: HashSet<TypeRef>,
    /// Interface walks are skipped unless some bound is an interface.
    contains_interfaces: bool,
}

impl UpperBounds {
    fn contains_type_or_supertype(&self, ty: &TypeRef) -> bool {
        ty.any_ancestor(self.contains_interfaces, |ancestor| self.types.contains(ancestor))
    }
}

/// Signature-bucketed registry of enrolled members of one kind.
#[derive(Debug, Clone)]
pub struct MemberRegistry<S> {
    buckets: HashMap<S, UpperBounds>,
}

impl<S> Default for MemberRegistry<S> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<S: Eq + Hash> MemberRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll `signature` for `upper_bound` and its subtypes. Returns `false`
    /// when the pair was already present.
    pub fn add(&mut self, upper_bound: TypeRef, signature: S) -> bool {
        let bounds = self.buckets.entry(signature).or_default();
        bounds.contains_interfaces |= upper_bound.is_interface();
        bounds.types.insert(upper_bound)
    }

    /// `true` when `signature` was enrolled against `concrete` or one of its
    /// supertypes.
    pub fn matches(&self, concrete: &TypeRef, signature: &S) -> bool {
        self.buckets
            .get(signature)
            .is_some_and(|bounds| bounds.contains_type_or_supertype(concrete))
    }

    /// Number of distinct `(upper bound, signature)` pairs.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.types.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Every enrolled pair, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&TypeRef, &S)> {
        self.buckets
            .iter()
            .flat_map(|(sig, bounds)| bounds.types.iter().map(move |ty| (ty, sig)))
    }
}
