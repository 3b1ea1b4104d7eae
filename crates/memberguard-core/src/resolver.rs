//! Type and member resolution.
//!
//! [`TypeResolver`] is the seam between the policy and whatever runtime owns
//! the host types. [`TypeCatalog`] is the in-memory implementation, assembled
//! from declarative [`TypeSpec`] records (in code or from a JSON file).

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, PolicyError, ResolveError};
use crate::model::{
    Constructor, ConstructorSignature, Field, FieldSignature, Method, MethodSignature, Primitive,
    TypeRef,
};
use crate::parser::{is_well_formed_type_name, strip_array_suffixes};

/// Looks up types and their publicly visible members by name.
pub trait TypeResolver {
    fn resolve_type(&self, qualified_name: &str) -> Result<TypeRef, ResolveError>;

    fn resolve_field(&self, owner: &TypeRef, name: &str) -> Result<Field, ResolveError>;

    fn resolve_method(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
    ) -> Result<Method, ResolveError>;

    fn resolve_constructor(
        &self,
        owner: &TypeRef,
        params: &[TypeRef],
    ) -> Result<Constructor, ResolveError>;
}

// ---------------------------------------------------------------------------
// Declarative type specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorSpec {
    #[serde(default)]
    pub params: Vec<String>,
}

/// Declaration of one type and the members it declares itself.
///
/// Type names in `extends`, `implements` and member signatures use the same
/// spelling as whitelist entries: qualified names or primitive keywords with
/// optional `[]` suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub kind: SpecKind,
    /// Superclass; only valid for classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Implemented interfaces, or super-interfaces for an interface.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorSpec>,
}

impl TypeSpec {
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name.into(), SpecKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name.into(), SpecKind::Interface)
    }

    fn new(name: String, kind: SpecKind) -> Self {
        Self {
            name,
            kind,
            extends: None,
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.extends = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value_type: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            value_type: value_type.into(),
        });
        self
    }

    pub fn method(self, name: impl Into<String>, params: &[&str]) -> Self {
        self.push_method(name.into(), params, None)
    }

    pub fn method_returning(
        self,
        name: impl Into<String>,
        params: &[&str],
        returns: impl Into<String>,
    ) -> Self {
        self.push_method(name.into(), params, Some(returns.into()))
    }

    fn push_method(mut self, name: String, params: &[&str], returns: Option<String>) -> Self {
        self.methods.push(MethodSpec {
            name,
            params: params.iter().map(|p| p.to_string()).collect(),
            returns,
        });
        self
    }

    pub fn constructor(mut self, params: &[&str]) -> Self {
        self.constructors.push(ConstructorSpec {
            params: params.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    fn supertype_names(&self) -> impl Iterator<Item = &str> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(String::as_str)
    }
}

/// On-disk catalog layout: `{ "types": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

// ---------------------------------------------------------------------------
// TypeCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct DeclaredMembers {
    methods: Vec<Method>,
    constructors: Vec<Constructor>,
    fields: Vec<Field>,
}

/// In-memory [`TypeResolver`] over a fixed set of declared types.
///
/// Method and field lookups see inherited members (owner, then superclasses,
/// then interfaces); constructor lookups only see the owner's own.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeRef>,
    members: HashMap<String, DeclaredMembers>,
}

impl TypeCatalog {
    /// An empty catalog: every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from type declarations listed in any order.
    pub fn from_specs(specs: impl IntoIterator<Item = TypeSpec>) -> Result<Self, CatalogError> {
        let mut pending: HashMap<String, TypeSpec> = HashMap::new();
        for spec in specs {
            if !is_well_formed_type_name(&spec.name) || Primitive::from_keyword(&spec.name).is_some()
            {
                return Err(CatalogError::MalformedTypeName(spec.name));
            }
            if pending.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateType(spec.name));
            }
            pending.insert(spec.name.clone(), spec);
        }

        for spec in pending.values() {
            for supertype in spec.supertype_names() {
                if !pending.contains_key(supertype) {
                    return Err(CatalogError::UnknownType {
                        owner: spec.name.clone(),
                        missing: supertype.to_string(),
                    });
                }
            }
        }

        let mut catalog = TypeCatalog::new();
        let mut defined: Vec<TypeSpec> = Vec::with_capacity(pending.len());

        // Define types once all of their supertypes exist; whatever never
        // becomes definable sits on an inheritance cycle.
        while !pending.is_empty() {
            let ready: BTreeSet<String> = pending
                .values()
                .filter(|spec| spec.supertype_names().all(|s| catalog.types.contains_key(s)))
                .map(|spec| spec.name.clone())
                .collect();

            if ready.is_empty() {
                let mut stuck: Vec<String> = pending.into_keys().collect();
                stuck.sort();
                return Err(CatalogError::InheritanceCycle(stuck));
            }

            for name in ready {
                if let Some(spec) = pending.remove(&name) {
                    let ty = catalog.define_type(&spec)?;
                    catalog.types.insert(name, ty);
                    defined.push(spec);
                }
            }
        }

        for spec in &defined {
            catalog.declare_members(spec)?;
        }

        tracing::debug!(types = catalog.types.len(), "type catalog assembled");
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::from_specs(file.types)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PolicyError> {
        let json = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a declared type by qualified name.
    pub fn get(&self, qualified_name: &str) -> Option<&TypeRef> {
        self.types.get(qualified_name)
    }

    fn define_type(&self, spec: &TypeSpec) -> Result<TypeRef, CatalogError> {
        let interfaces = spec
            .implements
            .iter()
            .map(|name| self.supertype(name, true))
            .collect::<Result<Vec<_>, _>>()?;

        match spec.kind {
            SpecKind::Interface => {
                if let Some(superclass) = &spec.extends {
                    return Err(CatalogError::InvalidSupertype(superclass.clone()));
                }
                Ok(TypeRef::interface(spec.name.clone(), interfaces))
            }
            SpecKind::Class => {
                let superclass = spec
                    .extends
                    .as_deref()
                    .map(|name| self.supertype(name, false))
                    .transpose()?;
                Ok(TypeRef::class(spec.name.clone(), superclass, interfaces))
            }
        }
    }

    fn supertype(&self, name: &str, want_interface: bool) -> Result<TypeRef, CatalogError> {
        let ty = self
            .types
            .get(name)
            .ok_or_else(|| CatalogError::InvalidSupertype(name.to_string()))?;
        if ty.is_interface() != want_interface {
            return Err(CatalogError::InvalidSupertype(name.to_string()));
        }
        Ok(ty.clone())
    }

    fn declare_members(&mut self, spec: &TypeSpec) -> Result<(), CatalogError> {
        let owner = self
            .types
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownType {
                owner: spec.name.clone(),
                missing: spec.name.clone(),
            })?;

        let mut declared = DeclaredMembers::default();
        for field in &spec.fields {
            declared.fields.push(Field {
                declaring_type: owner.clone(),
                signature: FieldSignature::new(field.name.clone()),
                value_type: self.member_type(&spec.name, &field.value_type)?,
            });
        }
        for method in &spec.methods {
            let return_type = method
                .returns
                .as_deref()
                .map(|name| self.member_type(&spec.name, name))
                .transpose()?;
            declared.methods.push(Method {
                declaring_type: owner.clone(),
                signature: MethodSignature::new(
                    method.name.clone(),
                    self.member_types(&spec.name, &method.params)?,
                ),
                return_type,
            });
        }
        for constructor in &spec.constructors {
            declared.constructors.push(Constructor {
                declaring_type: owner.clone(),
                signature: ConstructorSignature::new(
                    self.member_types(&spec.name, &constructor.params)?,
                ),
            });
        }

        self.members.insert(spec.name.clone(), declared);
        Ok(())
    }

    fn member_types(&self, owner: &str, names: &[String]) -> Result<Vec<TypeRef>, CatalogError> {
        names.iter().map(|name| self.member_type(owner, name)).collect()
    }

    fn member_type(&self, owner: &str, name: &str) -> Result<TypeRef, CatalogError> {
        let (base, dimensions) = strip_array_suffixes(name.trim());
        let base_type = match Primitive::from_keyword(base) {
            Some(primitive) => TypeRef::primitive(primitive),
            None => self
                .types
                .get(base)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownType {
                    owner: owner.to_string(),
                    missing: name.to_string(),
                })?,
        };
        Ok(TypeRef::array_of(base_type, dimensions))
    }

    fn declared(&self, ty: &TypeRef) -> Option<&DeclaredMembers> {
        self.members.get(ty.name())
    }
}

impl TypeResolver for TypeCatalog {
    fn resolve_type(&self, qualified_name: &str) -> Result<TypeRef, ResolveError> {
        self.types
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| ResolveError::TypeNotFound {
                name: qualified_name.to_string(),
            })
    }

    fn resolve_field(&self, owner: &TypeRef, name: &str) -> Result<Field, ResolveError> {
        owner
            .ancestors()
            .iter()
            .filter_map(|ty| self.declared(ty))
            .flat_map(|declared| declared.fields.iter())
            .find(|field| field.signature.name() == name)
            .cloned()
            .ok_or_else(|| ResolveError::FieldNotFound {
                owner: owner.name().to_string(),
                name: name.to_string(),
            })
    }

    fn resolve_method(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
    ) -> Result<Method, ResolveError> {
        owner
            .ancestors()
            .iter()
            .filter_map(|ty| self.declared(ty))
            .flat_map(|declared| declared.methods.iter())
            .find(|method| method.signature.name() == name && method.signature.params() == params)
            .cloned()
            .ok_or_else(|| ResolveError::MethodNotFound {
                owner: owner.name().to_string(),
                signature: MethodSignature::new(name, params.to_vec()).to_string(),
            })
    }

    fn resolve_constructor(
        &self,
        owner: &TypeRef,
        params: &[TypeRef],
    ) -> Result<Constructor, ResolveError> {
        self.declared(owner)
            .and_then(|declared| {
                declared
                    .constructors
                    .iter()
                    .find(|c| c.signature.params() == params)
            })
            .cloned()
            .ok_or_else(|| ResolveError::ConstructorNotFound {
                owner: owner.name().to_string(),
                signature: ConstructorSignature::new(params.to_vec()).to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_specs(vec![
            // Deliberately listed child-first.
            TypeSpec::class("pkg.Child")
                .extends("pkg.Base")
                .implements("pkg.Sized")
                .constructor(&["int"]),
            TypeSpec::interface("pkg.Sized").method_returning("size", &[], "int"),
            TypeSpec::class("pkg.Base")
                .field("count", "long")
                .method("put", &["java.lang.String", "byte[]"])
                .constructor(&[]),
            TypeSpec::class("java.lang.String"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_type() {
        let catalog = catalog();
        assert_eq!(catalog.resolve_type("pkg.Child").unwrap().name(), "pkg.Child");
        assert_eq!(
            catalog.resolve_type("pkg.Missing").unwrap_err(),
            ResolveError::TypeNotFound {
                name: "pkg.Missing".into()
            }
        );
    }

    #[test]
    fn test_inherited_members_resolve_with_declaring_type() {
        let catalog = catalog();
        let child = catalog.resolve_type("pkg.Child").unwrap();

        let field = catalog.resolve_field(&child, "count").unwrap();
        assert_eq!(field.declaring_type.name(), "pkg.Base");
        assert_eq!(field.value_type.name(), "long");

        let string = catalog.resolve_type("java.lang.String").unwrap();
        let bytes = TypeRef::array_of(TypeRef::primitive(Primitive::Byte), 1);
        let put = catalog.resolve_method(&child, "put", &[string, bytes]).unwrap();
        assert_eq!(put.declaring_type.name(), "pkg.Base");

        let size = catalog.resolve_method(&child, "size", &[]).unwrap();
        assert_eq!(size.declaring_type.name(), "pkg.Sized");
        assert_eq!(size.return_type.unwrap().name(), "int");
    }

    #[test]
    fn test_constructors_are_not_inherited() {
        let catalog = catalog();
        let child = catalog.resolve_type("pkg.Child").unwrap();
        let base = catalog.resolve_type("pkg.Base").unwrap();
        assert!(catalog.resolve_constructor(&base, &[]).is_ok());
        let err = catalog.resolve_constructor(&child, &[]).unwrap_err();
        assert_eq!(err.to_string(), "constructor not found: pkg.Child()");
        let int = TypeRef::primitive(Primitive::Int);
        assert!(catalog.resolve_constructor(&child, &[int]).is_ok());
    }

    #[test]
    fn test_method_lookup_requires_exact_params() {
        let catalog = catalog();
        let base = catalog.resolve_type("pkg.Base").unwrap();
        let err = catalog.resolve_method(&base, "put", &[]).unwrap_err();
        assert!(matches!(err, ResolveError::MethodNotFound { .. }));
    }

    #[test]
    fn test_unknown_supertype_rejected() {
        let err = TypeCatalog::from_specs(vec![TypeSpec::class("a.A").extends("a.Gone")]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownType {
                owner: "a.A".into(),
                missing: "a.Gone".into()
            }
        );
    }

    #[test]
    fn test_unknown_member_type_rejected() {
        let err =
            TypeCatalog::from_specs(vec![TypeSpec::class("a.A").method("f", &["a.Gone[]"])]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownType { .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = TypeCatalog::from_specs(vec![
            TypeSpec::class("a.A").extends("a.B"),
            TypeSpec::class("a.B").extends("a.A"),
            TypeSpec::class("a.C"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::InheritanceCycle(vec!["a.A".into(), "a.B".into()])
        );
    }

    #[test]
    fn test_class_cannot_extend_interface() {
        let err = TypeCatalog::from_specs(vec![
            TypeSpec::interface("a.I"),
            TypeSpec::class("a.A").extends("a.I"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::InvalidSupertype("a.I".into()));
    }

    #[test]
    fn test_duplicate_and_malformed_names_rejected() {
        let dup = TypeCatalog::from_specs(vec![TypeSpec::class("a.A"), TypeSpec::class("a.A")]);
        assert_eq!(dup.unwrap_err(), CatalogError::DuplicateType("a.A".into()));

        let bad = TypeCatalog::from_specs(vec![TypeSpec::class("a..A")]);
        assert!(matches!(bad.unwrap_err(), CatalogError::MalformedTypeName(_)));

        let prim = TypeCatalog::from_specs(vec![TypeSpec::class("int")]);
        assert!(matches!(prim.unwrap_err(), CatalogError::MalformedTypeName(_)));
    }

    #[test]
    fn test_catalog_from_json() {
        let json = serde_json::json!({
            "types": [
                { "name": "pkg.Point", "fields": [{ "name": "x", "type": "int" }],
                  "constructors": [{ "params": ["int", "int"] }] },
                { "name": "pkg.Shape", "kind": "interface",
                  "methods": [{ "name": "area", "returns": "double" }] }
            ]
        })
        .to_string();
        let catalog = TypeCatalog::from_json_str(&json).unwrap();
        assert_eq!(catalog.len(), 2);
        let shape = catalog.get("pkg.Shape").unwrap();
        assert!(shape.is_interface());
        assert!(catalog.resolve_method(shape, "area", &[]).is_ok());
    }
}
