//! Whitelist policy facade.
//!
//! [`WhitelistPolicy`] is built once from parsed selectors and is immutable
//! afterwards. [`WhitelistPolicy::for_type`] hands out a borrowed
//! [`TypeExposure`] that answers member queries for one concrete type.

use std::fmt;
use std::sync::Arc;

use crate::error::SyntaxError;
use crate::fingerprint::PolicyFingerprint;
use crate::model::{Constructor, Field, MemberRef, Method, TypeRef};
use crate::obs;
use crate::overrides::{NoOverrides, OverrideCheck};
use crate::parser;
use crate::registry::{ConstructorRegistry, FieldRegistry, MethodRegistry};
use crate::resolver::TypeResolver;
use crate::selector::{MemberSelector, ResolutionFailure};

/// What happened to each selector while the policy was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub methods: usize,
    pub constructors: usize,
    pub fields: usize,
    /// Selectors dropped because they did not resolve, in input order.
    pub ignored: Vec<ResolutionFailure>,
}

impl BuildReport {
    /// Selectors routed into a registry.
    pub fn active(&self) -> usize {
        self.methods + self.constructors + self.fields
    }
}

/// Whitelist-based member access policy.
///
/// A member enrolled against an upper bound type is exposed on that type and
/// every subtype of it, never on its supertypes. Members flagged by the
/// [`OverrideCheck`] are exposed regardless.
pub struct WhitelistPolicy {
    methods: MethodRegistry,
    constructors: ConstructorRegistry,
    fields: FieldRegistry,
    overrides: Arc<dyn OverrideCheck>,
    report: BuildReport,
}

impl WhitelistPolicy {
    /// Build from parsed selectors with no override markers.
    pub fn build(selectors: impl IntoIterator<Item = MemberSelector>) -> Self {
        Self::build_with_overrides(selectors, Arc::new(NoOverrides))
    }

    pub fn build_with_overrides(
        selectors: impl IntoIterator<Item = MemberSelector>,
        overrides: Arc<dyn OverrideCheck>,
    ) -> Self {
        let mut methods = MethodRegistry::new();
        let mut constructors = ConstructorRegistry::new();
        let mut fields = FieldRegistry::new();
        let mut report = BuildReport::default();

        for selector in selectors {
            match selector {
                MemberSelector::Method {
                    upper_bound,
                    method,
                } => {
                    methods.add(upper_bound, method.signature);
                    report.methods += 1;
                }
                MemberSelector::Constructor {
                    upper_bound,
                    constructor,
                } => {
                    constructors.add(upper_bound, constructor.signature);
                    report.constructors += 1;
                }
                MemberSelector::Field { upper_bound, field } => {
                    fields.add(upper_bound, field.signature);
                    report.fields += 1;
                }
                MemberSelector::Failure(failure) => {
                    obs::emit_selector_ignored(&failure);
                    report.ignored.push(failure);
                }
            }
        }

        obs::emit_policy_built(&report);
        Self {
            methods,
            constructors,
            fields,
            overrides,
            report,
        }
    }

    /// Parse raw whitelist entries and build the policy. Any malformed entry
    /// rejects the whole batch.
    pub fn from_entries<I, S, R>(entries: I, resolver: &R) -> Result<Self, SyntaxError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: TypeResolver + ?Sized,
    {
        let selectors =
            parser::parse_all(entries, resolver).inspect_err(obs::emit_whitelist_rejected)?;
        Ok(Self::build(selectors))
    }

    /// Exposure view for one concrete type. Allocation free.
    pub fn for_type<'a>(&'a self, concrete: &'a TypeRef) -> TypeExposure<'a> {
        TypeExposure {
            policy: self,
            concrete,
        }
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn constructors(&self) -> &ConstructorRegistry {
        &self.constructors
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn fingerprint(&self) -> PolicyFingerprint {
        PolicyFingerprint::compute(self)
    }
}

impl fmt::Debug for WhitelistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhitelistPolicy")
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

/// Member exposure answers for a single concrete type.
#[derive(Clone, Copy)]
pub struct TypeExposure<'a> {
    policy: &'a WhitelistPolicy,
    concrete: &'a TypeRef,
}

impl TypeExposure<'_> {
    pub fn is_method_exposed(&self, method: &Method) -> bool {
        self.policy.methods.matches(self.concrete, &method.signature)
            || self.is_marked(MemberRef::from(method))
    }

    pub fn is_constructor_exposed(&self, constructor: &Constructor) -> bool {
        self.policy
            .constructors
            .matches(self.concrete, &constructor.signature)
            || self.is_marked(MemberRef::from(constructor))
    }

    pub fn is_field_exposed(&self, field: &Field) -> bool {
        self.policy.fields.matches(self.concrete, &field.signature)
            || self.is_marked(MemberRef::from(field))
    }

    fn is_marked(&self, member: MemberRef<'_>) -> bool {
        self.policy.overrides.is_marked(self.concrete, member)
    }
}

impl fmt::Debug for TypeExposure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeExposure")
            .field("concrete", self.concrete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSignature, MethodSignature, Primitive};
    use crate::overrides::MarkerSet;
    use crate::resolver::{TypeCatalog, TypeSpec};

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_specs(vec![
            TypeSpec::class("pkg.Base")
                .method("greet", &[])
                .field("id", "long")
                .constructor(&[]),
            TypeSpec::class("pkg.Sub")
                .extends("pkg.Base")
                .method("extra", &["int"])
                .constructor(&[]),
        ])
        .unwrap()
    }

    fn method(catalog: &TypeCatalog, owner: &str, name: &str, params: &[TypeRef]) -> Method {
        let ty = catalog.get(owner).unwrap();
        catalog.resolve_method(ty, name, params).unwrap()
    }

    #[test]
    fn test_enrolled_on_subtype_stays_hidden_on_supertype() {
        let catalog = catalog();
        let policy = WhitelistPolicy::from_entries(["pkg.Sub.greet()"], &catalog).unwrap();
        let base = catalog.get("pkg.Base").unwrap();
        let sub = catalog.get("pkg.Sub").unwrap();
        let greet = method(&catalog, "pkg.Base", "greet", &[]);

        assert!(policy.for_type(sub).is_method_exposed(&greet));
        assert!(!policy.for_type(base).is_method_exposed(&greet));
    }

    #[test]
    fn test_routes_each_kind() {
        let catalog = catalog();
        let policy = WhitelistPolicy::from_entries(
            ["pkg.Base.greet()", "pkg.Base.Base()", "pkg.Base.id", "pkg.Sub.extra(int)"],
            &catalog,
        )
        .unwrap();
        let report = policy.report();
        assert_eq!(report.methods, 2);
        assert_eq!(report.constructors, 1);
        assert_eq!(report.fields, 1);
        assert!(report.ignored.is_empty());

        let sub = catalog.get("pkg.Sub").unwrap();
        let exposure = policy.for_type(sub);
        let sub_ctor = catalog.resolve_constructor(sub, &[]).unwrap();
        let id = catalog.resolve_field(sub, "id").unwrap();
        let extra = method(
            &catalog,
            "pkg.Sub",
            "extra",
            &[TypeRef::primitive(Primitive::Int)],
        );
        assert!(exposure.is_constructor_exposed(&sub_ctor));
        assert!(exposure.is_field_exposed(&id));
        assert!(exposure.is_method_exposed(&extra));
    }

    #[test]
    fn test_failures_are_reported_not_enrolled() {
        let catalog = catalog();
        let policy = WhitelistPolicy::from_entries(
            ["pkg.Base.greet()", "pkg.Gone.x", "pkg.Base.nope"],
            &catalog,
        )
        .unwrap();
        assert_eq!(policy.report().active(), 1);
        assert_eq!(policy.report().ignored.len(), 2);
        assert_eq!(policy.report().ignored[0].entry, "pkg.Gone.x");
    }

    #[test]
    fn test_syntax_error_builds_nothing() {
        let catalog = catalog();
        let err =
            WhitelistPolicy::from_entries(["pkg.Base.greet()", "greet()"], &catalog).unwrap_err();
        assert_eq!(err.entry, "greet()");
    }

    #[test]
    fn test_override_exposes_without_whitelist_entry() {
        let catalog = catalog();
        let base = catalog.get("pkg.Base").unwrap().clone();
        let sub = catalog.get("pkg.Sub").unwrap();
        let markers = MarkerSet::new()
            .with_method(base.clone(), MethodSignature::new("greet", vec![]))
            .with_field(sub.clone(), FieldSignature::new("id"));
        let policy = WhitelistPolicy::build_with_overrides(Vec::new(), Arc::new(markers));

        let greet = method(&catalog, "pkg.Base", "greet", &[]);
        let id = catalog.resolve_field(&base, "id").unwrap();
        assert!(policy.for_type(sub).is_method_exposed(&greet));
        assert!(policy.for_type(&base).is_method_exposed(&greet));
        assert!(policy.for_type(sub).is_field_exposed(&id));
        assert!(!policy.for_type(&base).is_field_exposed(&id));
    }

    #[test]
    fn test_empty_policy_exposes_nothing() {
        let catalog = catalog();
        let policy = WhitelistPolicy::build(Vec::new());
        let base = catalog.get("pkg.Base").unwrap();
        let greet = method(&catalog, "pkg.Base", "greet", &[]);
        assert!(!policy.for_type(base).is_method_exposed(&greet));
        assert_eq!(policy.report().active(), 0);
    }

    #[test]
    fn test_policy_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WhitelistPolicy>();
        assert_send_sync::<TypeExposure<'static>>();
    }
}
