//! Normalization of numpydoc type phrases.
//!
//! [`DocTypeNormalizer`] turns phrases such as `array-like of shape
//! (n_samples,)`, `int or None` or `{'auto', 'full'}` into canonical type
//! strings. A phrase with any component it does not recognize is left
//! unresolved, so it shows up in the missing-type report for review.

use typecorr_core::aggregate::{RawTypeNormalizer, TrivialityPredicate};
use typecorr_core::catalog::{ARRAY_LIKE, MATRIX_LIKE};
use typecorr_core::state::ImportMap;

use crate::phrase::{split_top_level, strip_qualifiers};

/// Builtin spellings and their canonical names.
const BUILTINS: &[(&str, &str)] = &[
    ("int", "int"),
    ("integer", "int"),
    ("float", "float"),
    ("str", "str"),
    ("string", "str"),
    ("bool", "bool"),
    ("boolean", "bool"),
    ("dict", "dict"),
    ("dictionary", "dict"),
    ("list", "list"),
    ("tuple", "tuple"),
    ("none", "None"),
    ("callable", "Callable"),
    ("function", "Callable"),
];

const NDARRAY_SPELLINGS: &[&str] = &["ndarray", "np.ndarray", "numpy.ndarray", "numpy array"];

/// Names a trivial phrase may consist of.
const TRIVIAL_NAMES: &[&str] = &["int", "float", "str", "bool", "None", "dict", "list", "tuple"];

/// Split a phrase into its alternatives: `a or b`, `a, b`, `a | b`.
fn alternatives(phrase: &str) -> Vec<&str> {
    split_top_level(phrase, &[',', '|'])
        .into_iter()
        .flat_map(|part| part.split(" or "))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Number of dimensions in an `of shape (...)` clause.
fn shape_rank(phrase: &str) -> Option<usize> {
    let start = phrase.find("of shape")?;
    let rest = &phrase[start..];
    let open = rest.find('(')?;
    let close = rest[open..].find(')')? + open;
    Some(split_top_level(&rest[open + 1..close], &[',']).len())
}

/// `class` names of the import map, matched on their last dotted segment.
fn imported_class<'a>(name: &'a str, imports: &ImportMap) -> Option<&'a str> {
    let leaf = name.rsplit('.').next().unwrap_or(name);
    let is_ident = !leaf.is_empty()
        && leaf
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
        && !leaf.starts_with(|c: char| c.is_ascii_digit());
    (is_ident && imports.contains_key(leaf)).then_some(leaf)
}

/// Phrase normalizer for numpydoc type descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocTypeNormalizer;

impl DocTypeNormalizer {
    /// Phrases that describe one container as a whole, commas included.
    fn whole_phrase(&self, phrase: &str) -> Option<String> {
        let lower = phrase.to_ascii_lowercase();

        if lower.starts_with('{') && (lower.contains("array") || lower.contains("matrix")) {
            let canonical = if lower.contains("matrix") || shape_rank(&lower) == Some(2) {
                MATRIX_LIKE
            } else {
                ARRAY_LIKE
            };
            return Some(canonical.to_string());
        }

        if lower.starts_with("array-like") || lower.starts_with("array_like") {
            let canonical = if shape_rank(&lower).is_some_and(|rank| rank >= 2) {
                MATRIX_LIKE
            } else {
                ARRAY_LIKE
            };
            return Some(canonical.to_string());
        }
        None
    }

    fn component(&self, text: &str, imports: &ImportMap) -> Option<String> {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();

        if let Some(inner) = lower
            .strip_prefix("an instance of ")
            .or_else(|| lower.strip_prefix("instance of "))
        {
            let start = text.len() - inner.len();
            return self.component(&text[start..], imports);
        }
        for suffix in [" object", " instance"] {
            if lower.ends_with(suffix) {
                return self.component(&text[..text.len() - suffix.len()], imports);
            }
        }

        if lower.starts_with("array-like") || lower.starts_with("array_like") {
            return Some(ARRAY_LIKE.to_string());
        }
        if lower.contains("sparse matrix") {
            return Some(MATRIX_LIKE.to_string());
        }
        if NDARRAY_SPELLINGS
            .iter()
            .any(|s| lower == *s || lower.starts_with(&format!("{} of ", s)))
        {
            return Some("np.ndarray".to_string());
        }

        if let Some(item) = lower.strip_prefix("list of ") {
            let start = text.len() - item.len();
            let item = self.component(&text[start..], imports)?;
            return Some(format!("list[{}]", item));
        }

        if text.starts_with('{') && text.ends_with('}') {
            return literal_set(&text[1..text.len() - 1]);
        }

        if let Some((_, canonical)) = BUILTINS.iter().find(|(spelling, _)| lower == *spelling) {
            return Some(canonical.to_string());
        }

        imported_class(text, imports).map(str::to_string)
    }
}

/// `'a', 'b'` becomes `Literal['a', 'b']`. Integers are allowed too.
fn literal_set(inner: &str) -> Option<String> {
    let mut values = Vec::new();
    for item in split_top_level(inner, &[',']) {
        let quoted = item.len() >= 2
            && ((item.starts_with('\'') && item.ends_with('\''))
                || (item.starts_with('"') && item.ends_with('"')));
        if quoted {
            values.push(format!("'{}'", &item[1..item.len() - 1]));
        } else if item.parse::<i64>().is_ok() {
            values.push(item.to_string());
        } else {
            return None;
        }
    }
    if values.is_empty() {
        return None;
    }
    Some(format!("Literal[{}]", values.join(", ")))
}

impl RawTypeNormalizer for DocTypeNormalizer {
    fn normalize(
        &self,
        raw: &str,
        module: &str,
        imports: &ImportMap,
        is_param: bool,
    ) -> Option<String> {
        let stripped = strip_qualifiers(raw.trim());
        let mut members: Vec<String> = Vec::new();

        match self.whole_phrase(&stripped.ty) {
            Some(canonical) => members.push(canonical),
            None => {
                for alt in alternatives(&stripped.ty) {
                    let canonical = self.component(alt, imports)?;
                    if !members.contains(&canonical) {
                        members.push(canonical);
                    }
                }
            }
        }

        if is_param && stripped.default_none && !members.iter().any(|m| m == "None") {
            members.push("None".to_string());
        }
        if members.is_empty() {
            return None;
        }
        tracing::trace!("{}: normalized '{}' to '{}'", module, raw, members.join("|"));
        Some(members.join("|"))
    }
}

/// A phrase is trivial when every alternative is a plain builtin or an
/// imported class.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTriviality;

impl TrivialityPredicate for DefaultTriviality {
    fn is_trivial(&self, raw: &str, _module: &str, imports: &ImportMap) -> bool {
        let stripped = strip_qualifiers(raw.trim());
        let alts = alternatives(&stripped.ty);
        !alts.is_empty()
            && alts
                .iter()
                .all(|alt| TRIVIAL_NAMES.contains(alt) || imported_class(alt, imports).is_some())
    }
}
