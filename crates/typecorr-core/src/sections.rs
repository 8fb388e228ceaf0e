//! The sectioned data model.
//!
//! Documented types come in three logical sections: parameters, returns and
//! attributes. [`Sections`] is a generic triple indexed by [`Section`]; it
//! carries documentation records, frequency counters, known-type maps and
//! per-section reports alike.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered `name -> type-string` mapping for one documentation section.
///
/// Order is documentation order. For returns, unnamed values are keyed by
/// their ordinal (`"0"`, `"1"`, ...).
pub type DocMap = IndexMap<String, String>;

/// One logical documentation section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Function and constructor parameters.
    Params,
    /// Return values.
    Returns,
    /// Class attributes.
    Attrs,
}

impl Section {
    /// All sections in report order.
    pub const ALL: [Section; 3] = [Section::Params, Section::Returns, Section::Attrs];

    /// Returns the string representation used in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Params => "params",
            Section::Returns => "returns",
            Section::Attrs => "attrs",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections<T> {
    pub params: T,
    pub returns: T,
    pub attrs: T,
}

impl<T> Sections<T> {
    pub fn new(params: T, returns: T, attrs: T) -> Self {
        Sections {
            params,
            returns,
            attrs,
        }
    }

    pub fn get(&self, section: Section) -> &T {
        match section {
            Section::Params => &self.params,
            Section::Returns => &self.returns,
            Section::Attrs => &self.attrs,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut T {
        match section {
            Section::Params => &mut self.params,
            Section::Returns => &mut self.returns,
            Section::Attrs => &mut self.attrs,
        }
    }

    /// Iterate `(section, value)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &T)> {
        Section::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Transform each section's value.
    pub fn map<U>(self, mut f: impl FnMut(Section, T) -> U) -> Sections<U> {
        Sections {
            params: f(Section::Params, self.params),
            returns: f(Section::Returns, self.returns),
            attrs: f(Section::Attrs, self.attrs),
        }
    }
}

/// Parsed documentation for one symbol.
///
/// `None` in a section means the documentation has no such section at all;
/// `Some(empty)` means the section is present but lists nothing. Constructor
/// fallback depends on that distinction.
pub type DocRecord = Sections<Option<DocMap>>;

impl DocRecord {
    /// A record with no sections, as produced for an unresolved symbol.
    pub fn undocumented() -> Self {
        Sections::new(None, None, None)
    }

    /// True when no section is present.
    pub fn is_undocumented(&self) -> bool {
        self.params.is_none() && self.returns.is_none() && self.attrs.is_none()
    }

    /// The single type string describing the documented return value.
    ///
    /// One value yields its type; several yield `tuple[T1,T2,...]` in
    /// documentation order; none yields `None`.
    pub fn return_type(&self) -> Option<String> {
        let returns = self.returns.as_ref()?;
        match returns.len() {
            0 => None,
            1 => returns.values().next().cloned(),
            _ => {
                let types: Vec<&str> = returns.values().map(String::as_str).collect();
                Some(format!("tuple[{}]", types.join(",")))
            }
        }
    }

    /// The documented return type when exactly one value is documented.
    pub fn single_return(&self) -> Option<&str> {
        let returns = self.returns.as_ref()?;
        if returns.len() == 1 {
            returns.values().next().map(String::as_str)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_map(entries: &[(&str, &str)]) -> DocMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sections_iterate_in_report_order() {
        let s = Sections::new(1, 2, 3);
        let order: Vec<Section> = s.iter().map(|(sec, _)| sec).collect();
        assert_eq!(order, vec![Section::Params, Section::Returns, Section::Attrs]);
        assert_eq!(*s.get(Section::Returns), 2);
    }

    #[test]
    fn sections_map_keeps_section_identity() {
        let s = Sections::new("a", "b", "c").map(|sec, v| format!("{}={}", sec, v));
        assert_eq!(s.attrs, "attrs=c");
    }

    #[test]
    fn return_type_single_value() {
        let mut record = DocRecord::undocumented();
        record.returns = Some(doc_map(&[("self", "object")]));
        assert_eq!(record.return_type().as_deref(), Some("object"));
        assert_eq!(record.single_return(), Some("object"));
    }

    #[test]
    fn return_type_multiple_values_is_tuple_in_doc_order() {
        let mut record = DocRecord::undocumented();
        record.returns = Some(doc_map(&[("X", "ndarray"), ("y", "int")]));
        assert_eq!(record.return_type().as_deref(), Some("tuple[ndarray,int]"));
        assert_eq!(record.single_return(), None);
    }

    #[test]
    fn empty_section_differs_from_absent_section() {
        let mut record = DocRecord::undocumented();
        assert!(record.is_undocumented());
        record.params = Some(DocMap::new());
        assert!(!record.is_undocumented());
        assert_eq!(record.return_type(), None);
    }
}
