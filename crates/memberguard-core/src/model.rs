//! Neutral type and member descriptors.
//!
//! A [`TypeRef`] is a shared handle to an immutable type description; members
//! are described by their signature plus the type that declares them. None of
//! this depends on any particular runtime's introspection facilities: a
//! [`crate::resolver::TypeResolver`] produces these values.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

/// Built-in primitive types, addressable by keyword in whitelist entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    /// Resolve a primitive keyword such as `int`; `None` for anything else.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What sort of type a [`TypeRef`] describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Primitive(Primitive),
    Array { component: TypeRef },
}

#[derive(Debug)]
struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
}

/// Shared handle to an immutable type description.
///
/// Identity is the fully qualified name: two handles with the same name are
/// equal and hash identically, whichever resolver produced them.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeDescriptor>);

impl TypeRef {
    pub fn class(
        name: impl Into<String>,
        superclass: Option<TypeRef>,
        interfaces: Vec<TypeRef>,
    ) -> Self {
        Self::from_descriptor(name.into(), TypeKind::Class, superclass, interfaces)
    }

    /// An interface type; `extends` lists its super-interfaces.
    pub fn interface(name: impl Into<String>, extends: Vec<TypeRef>) -> Self {
        Self::from_descriptor(name.into(), TypeKind::Interface, None, extends)
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::from_descriptor(
            primitive.keyword().to_string(),
            TypeKind::Primitive(primitive),
            None,
            Vec::new(),
        )
    }

    /// Wrap `component` in `dimensions` array levels. Zero dimensions returns
    /// the component itself.
    pub fn array_of(component: TypeRef, dimensions: usize) -> Self {
        let mut current = component;
        for _ in 0..dimensions {
            let name = format!("{}[]", current.name());
            current = Self::from_descriptor(
                name,
                TypeKind::Array { component: current },
                None,
                Vec::new(),
            );
        }
        current
    }

    fn from_descriptor(
        name: String,
        kind: TypeKind,
        superclass: Option<TypeRef>,
        interfaces: Vec<TypeRef>,
    ) -> Self {
        TypeRef(Arc::new(TypeDescriptor {
            name,
            kind,
            superclass,
            interfaces,
        }))
    }

    /// Fully qualified name, e.g. `com.example.Foo` or `int[]`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The unqualified name: everything after the last `.`.
    pub fn simple_name(&self) -> &str {
        match self.0.name.rfind('.') {
            Some(idx) => &self.0.name[idx + 1..],
            None => &self.0.name,
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.0.kind, TypeKind::Interface)
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        self.0.superclass.as_ref()
    }

    /// Directly implemented interfaces (for an interface: its super-interfaces).
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.0.interfaces
    }

    /// Visit `self`, then the superclass chain, then (when `interfaces` is
    /// set) every implemented interface breadth-first, each type at most
    /// once. Stops at the first type for which `visit` returns `true`.
    ///
    /// Cost is linear in the number of distinct ancestors, so interface
    /// diamonds are walked once per type rather than once per path.
    pub fn any_ancestor<F>(&self, interfaces: bool, mut visit: F) -> bool
    where
        F: FnMut(&TypeRef) -> bool,
    {
        let mut pending: VecDeque<&TypeRef> = VecDeque::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            if visit(ty) {
                return true;
            }
            if interfaces {
                pending.extend(ty.interfaces());
            }
            current = ty.superclass();
        }

        let mut seen: HashSet<&TypeRef> = HashSet::new();
        while let Some(iface) = pending.pop_front() {
            if !seen.insert(iface) {
                continue;
            }
            if visit(iface) {
                return true;
            }
            pending.extend(iface.interfaces());
        }
        false
    }

    /// Self first, then the superclass chain, then every implemented interface
    /// (super-interfaces included) in breadth-first order. Each type appears once.
    pub fn ancestors(&self) -> Vec<TypeRef> {
        let mut ordered = Vec::new();
        self.any_ancestor(true, |ty| {
            ordered.push(ty.clone());
            false
        });
        ordered
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[TypeRef]) -> fmt::Result {
    f.write_str("(")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(param.name())?;
    }
    f.write_str(")")
}

/// Name plus parameter types; return types never take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodSignature {
    name: String,
    params: Vec<TypeRef>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, params: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        write_params(f, &self.params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConstructorSignature {
    params: Vec<TypeRef>,
}

impl ConstructorSignature {
    pub fn new(params: Vec<TypeRef>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }
}

impl fmt::Display for ConstructorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_params(f, &self.params)
    }
}

/// Fields are identified by name alone; the field's type is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldSignature {
    name: String,
}

impl FieldSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Method {
    pub declaring_type: TypeRef,
    pub signature: MethodSignature,
    pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Constructor {
    pub declaring_type: TypeRef,
    pub signature: ConstructorSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub declaring_type: TypeRef,
    pub signature: FieldSignature,
    pub value_type: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Constructor => write!(f, "constructor"),
            MemberKind::Field => write!(f, "field"),
        }
    }
}

/// A borrowed view of any member's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef<'a> {
    Method(&'a MethodSignature),
    Constructor(&'a ConstructorSignature),
    Field(&'a FieldSignature),
}

impl fmt::Display for MemberRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Method(sig) => write!(f, "{sig}"),
            MemberRef::Constructor(sig) => write!(f, "<init>{sig}"),
            MemberRef::Field(sig) => write!(f, "{sig}"),
        }
    }
}

impl<'a> From<&'a Method> for MemberRef<'a> {
    fn from(method: &'a Method) -> Self {
        MemberRef::Method(&method.signature)
    }
}

impl<'a> From<&'a Constructor> for MemberRef<'a> {
    fn from(constructor: &'a Constructor) -> Self {
        MemberRef::Constructor(&constructor.signature)
    }
}

impl<'a> From<&'a Field> for MemberRef<'a> {
    fn from(field: &'a Field) -> Self {
        MemberRef::Field(&field.signature)
    }
}
