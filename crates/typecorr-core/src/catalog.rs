//! Recognized-type catalog and closed type classification.
//!
//! The catalog lists the concrete runtime types that render as the
//! placeholder names `ArrayLike`, `MatrixLike`, `Int` and `Float`. It is
//! plain configuration data (overridable from `typecorr.toml`); the renderer
//! never compares against hard-coded type identities.

use serde::{Deserialize, Serialize};

use crate::types::RuntimeType;

/// Placeholder for one-dimensional numeric containers.
pub const ARRAY_LIKE: &str = "ArrayLike";
/// Placeholder for two-dimensional numeric containers.
pub const MATRIX_LIKE: &str = "MatrixLike";
/// Placeholder for 64-bit integer-family scalars.
pub const INT: &str = "Int";
/// Placeholder for 32/64-bit floating scalars.
pub const FLOAT: &str = "Float";

/// Context flags threaded through every render call of one merge.
///
/// Derived from the documented type string: a documented `ArrayLike` or
/// `MatrixLike` allows traced containers to be rendered with the same
/// placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub array_like: bool,
    pub matrix_like: bool,
}

impl RenderContext {
    /// Derive the context from an optional documented type string.
    pub fn from_doc(doc_type: Option<&str>) -> Self {
        match doc_type {
            Some(doc) => RenderContext {
                array_like: doc.contains(ARRAY_LIKE),
                matrix_like: doc.contains(MATRIX_LIKE),
            },
            None => RenderContext::default(),
        }
    }
}

/// Closed classification of a runtime type under a render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// A catalogued numeric scalar (renders as `Int` / `Float`).
    Scalar,
    /// A parameterized container rendered as `name[args]`.
    Container,
    /// Renders as `ArrayLike`.
    ArrayLike,
    /// Renders as `MatrixLike`.
    MatrixLike,
    /// A union rendered member by member.
    Union,
    /// Anything else, rendered by bare name.
    Unknown,
}

/// Lists of recognized runtime types, by qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeCatalog {
    /// One-dimensional array containers and labeled sequences.
    pub array_like: Vec<String>,
    /// Two-dimensional tabular and sparse-matrix types.
    pub matrix_like: Vec<String>,
    /// Types rendered as `Int`.
    pub int_family: Vec<String>,
    /// Types rendered as `Float`.
    pub float_family: Vec<String>,
    /// Generic names whose single-argument form is array-like.
    pub list_like_generics: Vec<String>,
    /// Generic names rendered in lower case.
    pub lowercase_generics: Vec<String>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        TypeCatalog {
            array_like: owned(&["numpy.ndarray", "pandas.Series"]),
            matrix_like: owned(&[
                "numpy.ndarray",
                "pandas.DataFrame",
                "scipy.sparse.spmatrix",
                "scipy.sparse.csr_matrix",
                "scipy.sparse.csc_matrix",
            ]),
            int_family: owned(&["numpy.int64", "numpy.uint64"]),
            float_family: owned(&["numpy.float32", "numpy.float64"]),
            list_like_generics: owned(&["List", "list"]),
            lowercase_generics: owned(&["List", "Dict", "Tuple", "Set"]),
        }
    }
}

impl TypeCatalog {
    /// Classify `ty` for rendering under `ctx`.
    ///
    /// Array-like takes precedence over matrix-like when a type appears in
    /// both lists and both flags are set.
    pub fn classify(&self, ty: &RuntimeType, ctx: RenderContext) -> TypeClass {
        match ty {
            RuntimeType::Union { .. } => TypeClass::Union,
            RuntimeType::Generic { name, args } => {
                if ctx.array_like && args.len() == 1 && self.is_list_like(name) {
                    TypeClass::ArrayLike
                } else {
                    TypeClass::Container
                }
            }
            RuntimeType::Named { name } => {
                if ctx.array_like && Self::listed(&self.array_like, name) {
                    TypeClass::ArrayLike
                } else if ctx.matrix_like && Self::listed(&self.matrix_like, name) {
                    TypeClass::MatrixLike
                } else if self.is_int_family(name) || self.is_float_family(name) {
                    TypeClass::Scalar
                } else {
                    TypeClass::Unknown
                }
            }
        }
    }

    pub fn is_int_family(&self, name: &str) -> bool {
        Self::listed(&self.int_family, name)
    }

    pub fn is_float_family(&self, name: &str) -> bool {
        Self::listed(&self.float_family, name)
    }

    /// True for generic names like `List` / `typing.List` / `list`.
    pub fn is_list_like(&self, name: &str) -> bool {
        let bare = name.rsplit('.').next().unwrap_or(name);
        self.list_like_generics.iter().any(|n| n == bare)
    }

    /// The display name for a generic container (`typing.Dict` -> `dict`).
    pub fn container_name<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        let bare = name.rsplit('.').next().unwrap_or(name);
        if self.lowercase_generics.iter().any(|n| n == bare) {
            std::borrow::Cow::Owned(bare.to_lowercase())
        } else {
            std::borrow::Cow::Borrowed(bare)
        }
    }

    /// Match against a list by qualified name, tolerating `builtins.` and
    /// private implementation modules: `numpy.core.float64` matches
    /// `numpy.float64` on its first and last segments.
    fn listed(list: &[String], name: &str) -> bool {
        let name = name.strip_prefix("builtins.").unwrap_or(name);
        list.iter()
            .any(|entry| entry == name || same_root_and_leaf(entry, name))
    }
}

fn same_root_and_leaf(entry: &str, name: &str) -> bool {
    name.contains('.')
        && entry.split('.').next() == name.split('.').next()
        && entry.rsplit('.').next() == name.rsplit('.').next()
}
