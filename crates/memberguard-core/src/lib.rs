//! memberguard core library
//!
//! Whitelist-based member access policy for sandboxed evaluators that expose
//! host objects to untrusted scripts. Nothing is reachable unless a whitelist
//! entry enrolls it, or an [`OverrideCheck`] marks it.
//!
//! ```text
//! whitelist text ──parse──▶ MemberSelector ──build──▶ WhitelistPolicy ──for_type──▶ TypeExposure
//!                  (TypeResolver)
//! ```
//!
//! An entry such as `com.example.Report.render(int)` enrolls `render(int)`
//! against the upper bound type `com.example.Report`: it is exposed on
//! `Report` and every subtype, never on a supertype.
//!
//! # Modules
//!
//! - [`model`]       : `TypeRef`, member descriptors and signatures
//! - [`resolver`]    : `TypeResolver` trait, in-memory `TypeCatalog`
//! - [`parser`]      : whitelist entry grammar, `parse` / `parse_all`
//! - [`selector`]    : `MemberSelector`, `ResolutionFailure`
//! - [`registry`]    : subtype-aware `MemberRegistry`
//! - [`policy`]      : `WhitelistPolicy`, `TypeExposure`, `BuildReport`
//! - [`overrides`]   : `OverrideCheck`, `MarkerSet`
//! - [`source`]      : line-oriented whitelist files
//! - [`fingerprint`] : `PolicyFingerprint`
//! - [`error`]       : error taxonomy

pub mod error;
pub mod fingerprint;
pub mod model;
pub mod obs;
pub mod overrides;
pub mod parser;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod selector;
pub mod source;
pub mod telemetry;

pub use error::{CatalogError, PolicyError, ResolveError, Result, SyntaxError, SyntaxReason};
pub use fingerprint::PolicyFingerprint;
pub use model::{
    Constructor, ConstructorSignature, Field, FieldSignature, MemberKind, MemberRef, Method,
    MethodSignature, Primitive, TypeKind, TypeRef,
};
pub use overrides::{MarkerSet, NoOverrides, OverrideCheck};
pub use parser::{parse, parse_all};
pub use policy::{BuildReport, TypeExposure, WhitelistPolicy};
pub use registry::{ConstructorRegistry, FieldRegistry, MemberRegistry, MethodRegistry};
pub use resolver::{CatalogFile, TypeCatalog, TypeResolver, TypeSpec};
pub use selector::{MemberSelector, ResolutionFailure};
pub use source::WhitelistSource;
pub use telemetry::init_tracing;

/// memberguard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
