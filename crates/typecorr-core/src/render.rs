//! Rendering of runtime types into canonical type strings.
//!
//! The renderer is a structural recursion over [`RuntimeType`]. Each node is
//! classified once through the [`TypeCatalog`] and rendered according to its
//! [`TypeClass`]:
//!
//! - **Union**: members rendered in runtime order, joined with `|`
//! - **Container**: `name[arg1, arg2]`, typing aliases lower-cased
//! - **ArrayLike / MatrixLike**: the placeholder names
//! - **Scalar**: `Int` or `Float` for catalogued numeric widths
//! - **Unknown**: the bare class name, `NoneType` spelled `None`
//!
//! The [`RenderContext`] is threaded unchanged through every recursive call.

use crate::catalog::{RenderContext, TypeCatalog, TypeClass, ARRAY_LIKE, FLOAT, INT, MATRIX_LIKE};
use crate::types::{RuntimeType, NONE_TYPE};

/// Renders runtime types with a given catalog.
#[derive(Debug, Clone, Default)]
pub struct TypeRenderer {
    catalog: TypeCatalog,
}

impl TypeRenderer {
    pub fn new(catalog: TypeCatalog) -> Self {
        TypeRenderer { catalog }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Render one runtime type to its canonical string.
    pub fn render(&self, ty: &RuntimeType, ctx: RenderContext) -> String {
        match self.catalog.classify(ty, ctx) {
            TypeClass::Union => ty
                .members()
                .iter()
                .map(|m| self.render(m, ctx))
                .collect::<Vec<_>>()
                .join("|"),
            TypeClass::ArrayLike => ARRAY_LIKE.to_string(),
            TypeClass::MatrixLike => MATRIX_LIKE.to_string(),
            TypeClass::Container => match ty {
                RuntimeType::Generic { name, args } => {
                    let args: Vec<String> = args.iter().map(|a| self.render(a, ctx)).collect();
                    format!("{}[{}]", self.catalog.container_name(name), args.join(", "))
                }
                other => strip_qualification(&other.to_string()),
            },
            TypeClass::Scalar => {
                let name = ty.name().unwrap_or_default();
                if self.catalog.is_int_family(name) {
                    INT.to_string()
                } else {
                    FLOAT.to_string()
                }
            }
            TypeClass::Unknown => {
                let name = ty.name().unwrap_or_default();
                strip_qualification(&name.replace(NONE_TYPE, "None"))
            }
        }
    }
}

/// Remove dotted module qualifications, keeping trailing identifiers.
///
/// Every maximal run of identifier characters and dots is replaced by its
/// last segment, so `numpy.ndarray` becomes `ndarray` and
/// `foo.Bar[baz.Qux]` becomes `Bar[Qux]`.
pub fn strip_qualification(repr: &str) -> String {
    let mut out = String::with_capacity(repr.len());
    let mut run = String::new();
    for c in repr.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            run.push(c);
        } else {
            flush_run(&mut out, &mut run);
            out.push(c);
        }
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.is_empty() {
        return;
    }
    // "..." and numeric literals are not qualified names
    let qualified = run.contains('.')
        && run.rsplit('.').next().is_some_and(|last| {
            last.chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
        });
    if qualified {
        out.push_str(run.rsplit('.').next().unwrap_or(run));
    } else {
        out.push_str(run);
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_type_expr;

    fn render(expr: &str, ctx: RenderContext) -> String {
        let ty = parse_type_expr(expr).unwrap();
        TypeRenderer::default().render(&ty, ctx)
    }

    fn plain() -> RenderContext {
        RenderContext::default()
    }

    fn arr() -> RenderContext {
        RenderContext {
            array_like: true,
            matrix_like: false,
        }
    }

    #[test]
    fn test_render_builtin_and_none() {
        assert_eq!(render("int", plain()), "int");
        assert_eq!(render("NoneType", plain()), "None");
        assert_eq!(render("builtins.str", plain()), "str");
    }

    #[test]
    fn test_render_strips_qualification() {
        assert_eq!(render("sklearn.base.BaseEstimator", plain()), "BaseEstimator");
        assert_eq!(render("numpy.ndarray", plain()), "ndarray");
    }

    #[test]
    fn test_render_union_preserves_order() {
        assert_eq!(render("str | int | None", plain()), "str|int|None");
        assert_eq!(render("Union[None, float]", plain()), "None|float");
    }

    #[test]
    fn test_render_generic_lowercases_typing_names() {
        assert_eq!(
            render("typing.Dict[str, typing.List[int]]", plain()),
            "dict[str, list[int]]"
        );
        assert_eq!(render("Tuple[int, numpy.float64]", plain()), "tuple[int, Float]");
        assert_eq!(render("collections.OrderedDict[str, int]", plain()), "OrderedDict[str, int]");
    }

    #[test]
    fn test_render_array_like_context() {
        assert_eq!(render("numpy.ndarray", arr()), "ArrayLike");
        assert_eq!(render("pandas.Series", arr()), "ArrayLike");
        assert_eq!(render("List[float]", arr()), "ArrayLike");
        assert_eq!(render("List[float]", plain()), "list[float]");
    }

    #[test]
    fn test_render_context_threads_through_unions_and_args() {
        assert_eq!(render("numpy.ndarray | None", arr()), "ArrayLike|None");
        assert_eq!(render("Dict[str, numpy.ndarray]", arr()), "dict[str, ArrayLike]");
    }

    #[test]
    fn test_render_matrix_like_context() {
        let ctx = RenderContext {
            array_like: false,
            matrix_like: true,
        };
        assert_eq!(render("scipy.sparse.csr_matrix", ctx), "MatrixLike");
        assert_eq!(render("pandas.DataFrame", ctx), "MatrixLike");
        assert_eq!(render("pandas.DataFrame", plain()), "DataFrame");
    }

    #[test]
    fn test_render_numeric_widths() {
        assert_eq!(render("numpy.int64", plain()), "Int");
        assert_eq!(render("numpy.uint64", plain()), "Int");
        assert_eq!(render("numpy.float32", plain()), "Float");
        assert_eq!(render("numpy.int32", plain()), "int32");
    }

    #[test]
    fn test_strip_qualification_keeps_non_names() {
        assert_eq!(strip_qualification("a.b.C[d.E, ...]"), "C[E, ...]");
        assert_eq!(strip_qualification("Literal[1.5]"), "Literal[1.5]");
        assert_eq!(strip_qualification("plain"), "plain");
    }
}
