//! Override markers: members exposed regardless of the whitelist.
//!
//! The policy consults an [`OverrideCheck`] after its registries. The lookup
//! is inheritable: a marker attached to a signature-equal member on the
//! concrete type or any ancestor counts, searched in the order self, then the
//! superclass chain, then implemented interfaces, each type visited once.

use std::collections::{HashMap, HashSet};

use crate::model::{
    ConstructorSignature, FieldSignature, MemberRef, MethodSignature, TypeRef,
};

/// Decides whether a member carries an override marker on `concrete` or one
/// of its ancestors.
pub trait OverrideCheck: Send + Sync {
    fn is_marked(&self, concrete: &TypeRef, member: MemberRef<'_>) -> bool;
}

/// Never marks anything; the whitelist alone decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl OverrideCheck for NoOverrides {
    fn is_marked(&self, _concrete: &TypeRef, _member: MemberRef<'_>) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
struct MarkedMembers {
    methods: HashSet<MethodSignature>,
    constructors: HashSet<ConstructorSignature>,
    fields: HashSet<FieldSignature>,
}

impl MarkedMembers {
    fn contains(&self, member: MemberRef<'_>) -> bool {
        match member {
            MemberRef::Method(sig) => self.methods.contains(sig),
            MemberRef::Constructor(sig) => self.constructors.contains(sig),
            MemberRef::Field(sig) => self.fields.contains(sig),
        }
    }
}

/// Explicit table of marked members, keyed by the type that carries the marker.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    marked: HashMap<TypeRef, MarkedMembers>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, owner: TypeRef, signature: MethodSignature) -> Self {
        self.marked.entry(owner).or_default().methods.insert(signature);
        self
    }

    pub fn with_constructor(mut self, owner: TypeRef, signature: ConstructorSignature) -> Self {
        self.marked
            .entry(owner)
            .or_default()
            .constructors
            .insert(signature);
        self
    }

    pub fn with_field(mut self, owner: TypeRef, signature: FieldSignature) -> Self {
        self.marked.entry(owner).or_default().fields.insert(signature);
        self
    }

    fn marked_on(&self, ty: &TypeRef, member: MemberRef<'_>) -> bool {
        self.marked
            .get(ty)
            .is_some_and(|members| members.contains(member))
    }
}

impl OverrideCheck for MarkerSet {
    fn is_marked(&self, concrete: &TypeRef, member: MemberRef<'_>) -> bool {
        if self.marked.is_empty() {
            return false;
        }
        concrete.any_ancestor(true, |ty| self.marked_on(ty, member))
    }
}
