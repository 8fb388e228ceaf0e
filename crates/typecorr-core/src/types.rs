//! Tagged runtime type representation.
//!
//! Traced call signatures report the types actually observed at runtime.
//! They arrive as type-expression strings (`numpy.ndarray`,
//! `typing.List[int]`, `int | None`, `typing.Optional[str]`) and are parsed
//! into [`RuntimeType`], a closed tree that the renderer walks structurally
//! without any runtime reflection.
//!
//! ## Grammar
//!
//! ```text
//! <expr>  := <atom> ("|" <atom>)*
//! <atom>  := <name> ("[" <expr> ("," <expr>)* "]")?
//!          | "[" <expr> ("," <expr>)* "]"
//!          | <quoted string>
//! <name>  := dotted identifier (also accepts "...")
//! ```
//!
//! `Union[...]` and `Optional[X]` produce [`RuntimeType::Union`]; `None`
//! produces `Named("NoneType")`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

/// Name used for the type of `None`.
pub const NONE_TYPE: &str = "NoneType";

/// Error type for type expression parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeExprError {
    /// The expression is syntactically invalid.
    #[error("invalid type expression '{input}': {message}")]
    InvalidExpression { input: String, message: String },
}

/// A runtime type observed by the tracer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeType {
    /// A plain class, possibly module-qualified (`numpy.ndarray`, `int`).
    Named { name: String },
    /// A parameterized generic (`typing.List[int]`, `dict[str, float]`).
    ///
    /// An empty name denotes a bare argument list, as in the parameter list
    /// of `Callable[[int], str]`.
    Generic { name: String, args: Vec<RuntimeType> },
    /// A union, members in the order the runtime reported them.
    Union { members: Vec<RuntimeType> },
}

impl RuntimeType {
    /// Create a named type.
    pub fn named(name: impl Into<String>) -> Self {
        RuntimeType::Named { name: name.into() }
    }

    /// Create a generic type.
    pub fn generic(name: impl Into<String>, args: Vec<RuntimeType>) -> Self {
        RuntimeType::Generic {
            name: name.into(),
            args,
        }
    }

    /// The type of `None`.
    pub fn none() -> Self {
        RuntimeType::named(NONE_TYPE)
    }

    /// Create a union, flattening nested unions and dropping duplicates.
    ///
    /// A union that ends up with a single member collapses to that member.
    pub fn union(members: Vec<RuntimeType>) -> Self {
        let mut flat: Vec<RuntimeType> = Vec::with_capacity(members.len());
        for member in members {
            match member {
                RuntimeType::Union { members: inner } => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or_else(RuntimeType::none)
        } else {
            RuntimeType::Union { members: flat }
        }
    }

    /// Parse a traced type expression.
    pub fn parse(input: &str) -> Result<Self, TypeExprError> {
        parse_type_expr(input)
    }

    /// True for union types.
    pub fn is_union(&self) -> bool {
        matches!(self, RuntimeType::Union { .. })
    }

    /// True for the type of `None`.
    pub fn is_none(&self) -> bool {
        matches!(self, RuntimeType::Named { name } if name == NONE_TYPE || name == "None")
    }

    /// The qualified name of a named or generic type.
    pub fn name(&self) -> Option<&str> {
        match self {
            RuntimeType::Named { name } | RuntimeType::Generic { name, .. } => Some(name),
            RuntimeType::Union { .. } => None,
        }
    }

    /// The last dotted segment of the type's name.
    pub fn bare_name(&self) -> Option<&str> {
        self.name().map(|n| n.rsplit('.').next().unwrap_or(n))
    }

    /// Union members, or the type itself for a non-union.
    pub fn members(&self) -> &[RuntimeType] {
        match self {
            RuntimeType::Union { members } => members,
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Named { name } => write!(f, "{}", name),
            RuntimeType::Generic { name, args } => {
                write!(f, "{}[", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "]")
            }
            RuntimeType::Union { members } => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a traced type expression into a [`RuntimeType`].
///
/// # Examples
///
/// ```
/// use typecorr_core::types::{parse_type_expr, RuntimeType};
///
/// let t = parse_type_expr("typing.Optional[int]").unwrap();
/// assert_eq!(t, RuntimeType::union(vec![RuntimeType::named("int"), RuntimeType::none()]));
/// ```
pub fn parse_type_expr(input: &str) -> Result<RuntimeType, TypeExprError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TypeExprError::InvalidExpression {
            input: input.to_string(),
            message: "empty expression".to_string(),
        });
    }

    (parse_union, multispace0)
        .map(|(ty, _)| ty)
        .parse(input)
        .map_err(|e| TypeExprError::InvalidExpression {
            input: input.to_string(),
            message: format!("{:?}", e),
        })
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

/// Parse `atom ("|" atom)*`.
fn parse_union(input: &mut &str) -> ModalResult<RuntimeType> {
    let first = parse_atom(input)?;

    let rest: Vec<RuntimeType> =
        repeat(0.., preceded((multispace0, '|', multispace0), parse_atom)).parse_next(input)?;

    if rest.is_empty() {
        Ok(first)
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok(RuntimeType::union(all))
    }
}

/// Parse a single atom: a name with optional arguments, a bare list, or a string.
fn parse_atom(input: &mut &str) -> ModalResult<RuntimeType> {
    let _ = multispace0.parse_next(input)?;

    alt((
        parse_bracket_args.map(|args| RuntimeType::generic("", args)),
        parse_quoted.map(RuntimeType::named),
        (parse_dotted_name, opt(parse_bracket_args)).map(|(name, args)| build_atom(name, args)),
    ))
    .parse_next(input)
}

/// Parse `"[" expr ("," expr)* "]"`.
fn parse_bracket_args(input: &mut &str) -> ModalResult<Vec<RuntimeType>> {
    delimited(
        (multispace0, '[', multispace0),
        separated(0.., parse_union, (multispace0, ',', multispace0)),
        (multispace0, ']'),
    )
    .parse_next(input)
}

/// Parse a dotted identifier.
fn parse_dotted_name(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

/// Parse a quoted string literal, keeping its quotes.
fn parse_quoted(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited('\'', take_till(0.., |c| c == '\''), '\'').map(|s: &str| format!("'{}'", s)),
        delimited('"', take_till(0.., |c| c == '"'), '"').map(|s: &str| format!("'{}'", s)),
    ))
    .parse_next(input)
}

/// Turn a parsed name and optional argument list into a type.
fn build_atom(name: String, args: Option<Vec<RuntimeType>>) -> RuntimeType {
    if name == "None" || name == NONE_TYPE || name == "builtins.NoneType" {
        return RuntimeType::none();
    }
    let bare = name.rsplit('.').next().unwrap_or(&name);
    match (bare, args) {
        ("Union", Some(args)) if !args.is_empty() => RuntimeType::union(args),
        ("Optional", Some(mut args)) if args.len() == 1 => {
            let inner = args.remove(0);
            RuntimeType::union(vec![inner, RuntimeType::none()])
        }
        (_, Some(args)) => RuntimeType::generic(name, args),
        (_, None) => RuntimeType::named(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        assert_eq!(parse_type_expr("int").unwrap(), RuntimeType::named("int"));
        assert_eq!(
            parse_type_expr("  numpy.ndarray ").unwrap(),
            RuntimeType::named("numpy.ndarray")
        );
    }

    #[test]
    fn test_parse_none_spellings() {
        assert!(parse_type_expr("None").unwrap().is_none());
        assert!(parse_type_expr("NoneType").unwrap().is_none());
    }

    #[test]
    fn test_parse_generic() {
        let t = parse_type_expr("typing.Dict[str, typing.List[int]]").unwrap();
        assert_eq!(
            t,
            RuntimeType::generic(
                "typing.Dict",
                vec![
                    RuntimeType::named("str"),
                    RuntimeType::generic("typing.List", vec![RuntimeType::named("int")]),
                ]
            )
        );
    }

    #[test]
    fn test_parse_pipe_union_keeps_order() {
        let t = parse_type_expr("str | int | None").unwrap();
        assert_eq!(
            t.members(),
            &[
                RuntimeType::named("str"),
                RuntimeType::named("int"),
                RuntimeType::none()
            ]
        );
    }

    #[test]
    fn test_parse_typing_union_and_optional() {
        let u = parse_type_expr("typing.Union[int, float]").unwrap();
        assert!(u.is_union());
        assert_eq!(u.members().len(), 2);

        let o = parse_type_expr("Optional[str]").unwrap();
        assert_eq!(
            o,
            RuntimeType::union(vec![RuntimeType::named("str"), RuntimeType::none()])
        );
    }

    #[test]
    fn test_union_flattens_and_dedupes() {
        let t = parse_type_expr("Union[int, Union[int, str]]").unwrap();
        assert_eq!(
            t.members(),
            &[RuntimeType::named("int"), RuntimeType::named("str")]
        );
        assert_eq!(
            RuntimeType::union(vec![RuntimeType::named("int"), RuntimeType::named("int")]),
            RuntimeType::named("int")
        );
    }

    #[test]
    fn test_parse_callable_and_literal() {
        let t = parse_type_expr("Callable[[int, str], None]").unwrap();
        match t {
            RuntimeType::Generic { name, args } => {
                assert_eq!(name, "Callable");
                assert_eq!(
                    args[0],
                    RuntimeType::generic(
                        "",
                        vec![RuntimeType::named("int"), RuntimeType::named("str")]
                    )
                );
                assert!(args[1].is_none());
            }
            other => panic!("Expected Generic, got {:?}", other),
        }

        let lit = parse_type_expr("Literal['auto', \"full\"]").unwrap();
        assert_eq!(lit.to_string(), "Literal['auto', 'full']");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_type_expr("").is_err());
        assert!(parse_type_expr("List[int").is_err());
        assert!(parse_type_expr("int |").is_err());
    }

    #[test]
    fn test_bare_name() {
        let t = RuntimeType::named("pandas.core.frame.DataFrame");
        assert_eq!(t.bare_name(), Some("DataFrame"));
        assert_eq!(RuntimeType::union(vec![t.clone(), RuntimeType::none()]).bare_name(), None);
    }
}
