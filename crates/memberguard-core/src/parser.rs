//! Whitelist entry grammar.
//!
//! ```text
//! <qualified.UpperBoundType>.<member>[(<argType>[, <argType> ...])]
//! ```
//!
//! Without a parameter list the entry names a field. With one, it names a
//! constructor when `<member>` equals the upper bound's simple name and a
//! method otherwise. Argument types are qualified names or primitive keywords,
//! each optionally followed by `[]` suffixes.
//!
//! Parsing happens in two phases. The syntactic phase either accepts the
//! whole entry or returns a [`SyntaxError`], which is fatal for the batch.
//! Only then are names resolved; anything missing becomes a
//! [`MemberSelector::Failure`] so one stale entry cannot break a whitelist.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ResolveError, SyntaxError, SyntaxReason};
use crate::model::{Primitive, TypeRef};
use crate::resolver::TypeResolver;
use crate::selector::{MemberSelector, ResolutionFailure};

const FORBIDDEN: [&str; 4] = ["<", ">", "...", ";"];

fn separator_whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\s*([.,()\[\]])\s*").expect("separator whitespace pattern is valid")
    })
}

/// Parse one whitelist entry, resolving its names through `resolver`.
pub fn parse<R>(entry: &str, resolver: &R) -> Result<MemberSelector, SyntaxError>
where
    R: TypeResolver + ?Sized,
{
    if FORBIDDEN.iter().any(|token| entry.contains(token)) {
        return Err(SyntaxError::new(SyntaxReason::ForbiddenCharacters, entry));
    }
    let cleaned = separator_whitespace().replace_all(entry.trim(), "$1");
    let syntax = EntrySyntax::split(entry, &cleaned)?;
    Ok(syntax.resolve(entry, resolver))
}

/// Parse a batch of entries, preserving order. The first syntax error aborts
/// the whole batch.
pub fn parse_all<I, S, R>(entries: I, resolver: &R) -> Result<Vec<MemberSelector>, SyntaxError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    R: TypeResolver + ?Sized,
{
    entries
        .into_iter()
        .map(|entry| parse(entry.as_ref(), resolver))
        .collect()
}

struct ParamSyntax<'a> {
    base: &'a str,
    dimensions: usize,
}

struct EntrySyntax<'a> {
    type_name: &'a str,
    member_name: &'a str,
    params: Option<Vec<ParamSyntax<'a>>>,
}

impl<'a> EntrySyntax<'a> {
    fn split(entry: &str, cleaned: &'a str) -> Result<Self, SyntaxError> {
        let error = |reason| SyntaxError::new(reason, entry);

        let (head, arg_list) = match cleaned.find('(') {
            Some(open) => {
                if !cleaned.ends_with(')') {
                    return Err(error(SyntaxReason::MissingClosingParen));
                }
                (&cleaned[..open], Some(&cleaned[open + 1..cleaned.len() - 1]))
            }
            None => (cleaned, None),
        };

        let dot = head.rfind('.').ok_or_else(|| error(SyntaxReason::MissingDot))?;
        let type_name = &head[..dot];
        let member_name = &head[dot + 1..];
        if !is_well_formed_type_name(type_name) {
            return Err(error(SyntaxReason::MalformedUpperBoundTypeName));
        }
        if !is_identifier(member_name) {
            return Err(error(SyntaxReason::MalformedMemberName));
        }

        let params = match arg_list {
            Some(list) => {
                let mut params = Vec::new();
                for token in list.split(',').filter(|t| !t.is_empty()) {
                    let (base, dimensions) = strip_array_suffixes(token);
                    if Primitive::from_keyword(base).is_none() && !is_well_formed_type_name(base)
                    {
                        return Err(error(SyntaxReason::MalformedArgumentTypeName));
                    }
                    params.push(ParamSyntax { base, dimensions });
                }
                Some(params)
            }
            None => None,
        };

        Ok(Self {
            type_name,
            member_name,
            params,
        })
    }

    fn resolve<R>(self, entry: &str, resolver: &R) -> MemberSelector
    where
        R: TypeResolver + ?Sized,
    {
        let failure = |upper_bound: Option<TypeRef>, cause: ResolveError| {
            MemberSelector::Failure(ResolutionFailure {
                upper_bound,
                cause,
                entry: entry.to_string(),
            })
        };

        let upper_bound = match resolver.resolve_type(self.type_name) {
            Ok(ty) => ty,
            Err(cause) => return failure(None, cause),
        };

        let Some(params) = self.params else {
            return match resolver.resolve_field(&upper_bound, self.member_name) {
                Ok(field) => MemberSelector::Field { upper_bound, field },
                Err(cause) => failure(Some(upper_bound), cause),
            };
        };

        let mut param_types = Vec::with_capacity(params.len());
        for param in params {
            let base = match Primitive::from_keyword(param.base) {
                Some(primitive) => TypeRef::primitive(primitive),
                None => match resolver.resolve_type(param.base) {
                    Ok(ty) => ty,
                    Err(cause) => return failure(Some(upper_bound), cause),
                },
            };
            param_types.push(TypeRef::array_of(base, param.dimensions));
        }

        // A member named like its type is always the constructor, even when a
        // method of that name exists.
        if self.member_name == upper_bound.simple_name() {
            match resolver.resolve_constructor(&upper_bound, &param_types) {
                Ok(constructor) => MemberSelector::Constructor {
                    upper_bound,
                    constructor,
                },
                Err(cause) => failure(Some(upper_bound), cause),
            }
        } else {
            match resolver.resolve_method(&upper_bound, self.member_name, &param_types) {
                Ok(method) => MemberSelector::Method {
                    upper_bound,
                    method,
                },
                Err(cause) => failure(Some(upper_bound), cause),
            }
        }
    }
}

/// Split trailing `[]` pairs off a type name, returning the base name and the
/// number of array dimensions.
pub(crate) fn strip_array_suffixes(name: &str) -> (&str, usize) {
    let mut base = name;
    let mut dimensions = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dimensions += 1;
    }
    (base, dimensions)
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Dot-separated identifiers, e.g. `com.example.Widget`.
pub(crate) fn is_well_formed_type_name(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberKind;
    use crate::resolver::{TypeCatalog, TypeSpec};

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_specs(vec![
            TypeSpec::class("java.lang.String"),
            TypeSpec::class("pkg.A")
                .field("size", "int")
                .method("foo", &["int", "int"])
                .method("bar", &["java.lang.String[]", "long[][]"])
                .method("A", &[])
                .constructor(&[])
                .constructor(&["java.lang.String"]),
        ])
        .unwrap()
    }

    fn syntax_reason(entry: &str) -> SyntaxReason {
        parse(entry, &catalog()).unwrap_err().reason
    }

    #[test]
    fn test_method_selector() {
        let selector = parse("pkg.A.foo(int, int)", &catalog()).unwrap();
        match selector {
            MemberSelector::Method {
                upper_bound,
                method,
            } => {
                assert_eq!(upper_bound.name(), "pkg.A");
                assert_eq!(method.signature.to_string(), "foo(int, int)");
            }
            other => panic!("expected method selector, got {:?}", other),
        }
    }

    #[test]
    fn test_constructor_selectors() {
        let catalog = catalog();
        let no_args = parse("pkg.A.A()", &catalog).unwrap();
        assert_eq!(no_args.kind(), Some(MemberKind::Constructor));

        let one_arg = parse("pkg.A.A(java.lang.String)", &catalog).unwrap();
        match one_arg {
            MemberSelector::Constructor { constructor, .. } => {
                assert_eq!(constructor.signature.params().len(), 1);
            }
            other => panic!("expected constructor selector, got {:?}", other),
        }
    }

    #[test]
    fn test_type_named_member_is_constructor_even_if_method_exists() {
        // pkg.A declares a method A() as well as a no-arg constructor.
        let selector = parse("pkg.A.A()", &catalog()).unwrap();
        assert_eq!(selector.kind(), Some(MemberKind::Constructor));
    }

    #[test]
    fn test_field_selector() {
        let selector = parse("pkg.A.size", &catalog()).unwrap();
        assert_eq!(selector.kind(), Some(MemberKind::Field));
    }

    #[test]
    fn test_whitespace_around_separators_is_collapsed() {
        let selector = parse(
            "  pkg . A . bar ( java.lang.String [ ] , long[ ][] )  ",
            &catalog(),
        )
        .unwrap();
        assert_eq!(selector.kind(), Some(MemberKind::Method));
    }

    #[test]
    fn test_array_dimensions_resolve() {
        match parse("pkg.A.bar(java.lang.String[], long[][])", &catalog()).unwrap() {
            MemberSelector::Method { method, .. } => {
                let names: Vec<_> = method.signature.params().iter().map(|t| t.name()).collect();
                assert_eq!(names, vec!["java.lang.String[]", "long[][]"]);
            }
            other => panic!("expected method selector, got {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_characters() {
        for entry in [
            "pkg.A.foo(int...)",
            "pkg.A<T>.foo()",
            "pkg.A.foo();",
            "java.util.List<String>.size()",
        ] {
            assert_eq!(syntax_reason(entry), SyntaxReason::ForbiddenCharacters, "{entry}");
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(syntax_reason("size"), SyntaxReason::MissingDot);
        assert_eq!(syntax_reason("foo(int)"), SyntaxReason::MissingDot);
        assert_eq!(syntax_reason("pkg.A.foo(int"), SyntaxReason::MissingClosingParen);
        assert_eq!(syntax_reason("pkg.A.foo(int) x"), SyntaxReason::MissingClosingParen);
        assert_eq!(syntax_reason(".foo"), SyntaxReason::MalformedUpperBoundTypeName);
        assert_eq!(syntax_reason("pkg..A.foo"), SyntaxReason::MalformedUpperBoundTypeName);
        assert_eq!(syntax_reason("1pkg.A.foo"), SyntaxReason::MalformedUpperBoundTypeName);
        assert_eq!(syntax_reason("pkg.A."), SyntaxReason::MalformedMemberName);
        assert_eq!(syntax_reason("pkg.A.9lives"), SyntaxReason::MalformedMemberName);
        assert_eq!(syntax_reason("pkg.A.foo-bar"), SyntaxReason::MalformedMemberName);
        assert_eq!(
            syntax_reason("pkg.A.foo(int x)"),
            SyntaxReason::MalformedArgumentTypeName
        );
        assert_eq!(
            syntax_reason("pkg.A.foo(int[)"),
            SyntaxReason::MalformedArgumentTypeName
        );
    }

    #[test]
    fn test_syntax_is_checked_before_resolution() {
        // Missing upper bound type, but the argument list is malformed.
        assert_eq!(
            syntax_reason("pkg.Missing.foo(1bad)"),
            SyntaxReason::MalformedArgumentTypeName
        );
    }

    #[test]
    fn test_missing_upper_bound_is_recoverable() {
        let selector = parse("pkg.Missing.foo()", &catalog()).unwrap();
        let failure = selector.as_failure().unwrap();
        assert!(failure.upper_bound.is_none());
        assert_eq!(
            failure.cause,
            ResolveError::TypeNotFound {
                name: "pkg.Missing".into()
            }
        );
        assert_eq!(failure.entry, "pkg.Missing.foo()");
    }

    #[test]
    fn test_missing_argument_type_keeps_upper_bound() {
        let selector = parse("pkg.A.foo(pkg.Gone)", &catalog()).unwrap();
        let failure = selector.as_failure().unwrap();
        assert_eq!(failure.upper_bound.as_ref().unwrap().name(), "pkg.A");
        assert!(matches!(failure.cause, ResolveError::TypeNotFound { .. }));
    }

    #[test]
    fn test_missing_members_are_recoverable() {
        let catalog = catalog();
        let cases = [
            ("pkg.A.foo(int)", "method not found"),
            ("pkg.A.A(int)", "constructor not found"),
            ("pkg.A.missing", "field not found"),
        ];
        for (entry, expected) in cases {
            let selector = parse(entry, &catalog).unwrap();
            let failure = selector.as_failure().unwrap();
            assert!(failure.cause.to_string().contains(expected), "{entry}");
        }
    }

    #[test]
    fn test_empty_argument_segments_are_skipped() {
        let selector = parse("pkg.A.foo(int,,int,)", &catalog()).unwrap();
        assert_eq!(selector.kind(), Some(MemberKind::Method));
    }

    #[test]
    fn test_parse_all_preserves_order_and_aborts_on_syntax_error() {
        let catalog = catalog();
        let selectors = parse_all(["pkg.A.size", "pkg.Nope.x", "pkg.A.A()"], &catalog).unwrap();
        assert_eq!(selectors.len(), 3);
        assert_eq!(selectors[0].kind(), Some(MemberKind::Field));
        assert!(selectors[1].is_failure());
        assert_eq!(selectors[2].kind(), Some(MemberKind::Constructor));

        let err = parse_all(["pkg.A.size", "pkg.A.foo(int...)", "pkg.A.A()"], &catalog).unwrap_err();
        assert_eq!(err.reason, SyntaxReason::ForbiddenCharacters);
        assert_eq!(err.entry, "pkg.A.foo(int...)");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("_x"));
        assert!(is_identifier("$proxy0"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a b"));
        assert!(is_well_formed_type_name("a.b.C"));
        assert!(!is_well_formed_type_name("a.b."));
        assert!(!is_well_formed_type_name(""));
    }

    #[test]
    fn test_strip_array_suffixes() {
        assert_eq!(strip_array_suffixes("int"), ("int", 0));
        assert_eq!(strip_array_suffixes("a.B[][]"), ("a.B", 2));
        assert_eq!(strip_array_suffixes("[]"), ("", 1));
    }
}
