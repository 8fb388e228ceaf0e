//! Numpydoc docstring parsing.
//!
//! Only the typed sections are extracted:
//!
//! | Heading | Section |
//! |---------|---------|
//! | `Parameters`, `Other Parameters` | params |
//! | `Returns`, `Yields` | returns |
//! | `Attributes` | attrs |
//!
//! A heading is a line underlined by a run of `-` at least as long as the
//! heading. Entries are the lines at the section's base indentation; deeper
//! lines are descriptions and are ignored.

use typecorr_core::sections::{DocMap, DocRecord, Section};

use crate::phrase::strip_qualifiers;

/// Parses raw documentation text into a [`DocRecord`].
pub trait DocstringParser {
    fn parse(&self, text: &str) -> DocRecord;
}

/// Parser for numpydoc-style docstrings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumpyDocstringParser;

impl DocstringParser for NumpyDocstringParser {
    fn parse(&self, text: &str) -> DocRecord {
        let cleaned = clean_docstring(text);
        let lines: Vec<&str> = cleaned.lines().collect();
        let headings = find_headings(&lines);

        let mut record = DocRecord::undocumented();
        for (i, &(line_idx, section)) in headings.iter().enumerate() {
            let body_start = line_idx + 2;
            let body_end = headings
                .get(i + 1)
                .map(|&(next, _)| next)
                .unwrap_or(lines.len());
            let Some(section) = section else {
                continue;
            };
            let entries = record.get_mut(section).get_or_insert_with(DocMap::new);
            parse_entries(&lines[body_start..body_end], section, entries);
        }
        record
    }
}

fn section_for(heading: &str) -> Option<Section> {
    match heading {
        "Parameters" | "Other Parameters" => Some(Section::Params),
        "Returns" | "Yields" => Some(Section::Returns),
        "Attributes" => Some(Section::Attrs),
        _ => None,
    }
}

/// Line indices of every heading, with the section it maps to (if any).
fn find_headings(lines: &[&str]) -> Vec<(usize, Option<Section>)> {
    let mut headings = Vec::new();
    for idx in 0..lines.len().saturating_sub(1) {
        let heading = lines[idx].trim();
        let underline = lines[idx + 1].trim();
        if !heading.is_empty()
            && !heading.starts_with('-')
            && underline.len() >= heading.len()
            && underline.chars().all(|c| c == '-')
        {
            headings.push((idx, section_for(heading)));
        }
    }
    headings
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn parse_entries(body: &[&str], section: Section, entries: &mut DocMap) {
    let Some(base) = body
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
    else {
        return;
    };

    let mut ordinal = entries.len();
    for line in body {
        if line.trim().is_empty() || indent_of(line) != base {
            continue;
        }
        let header = line.trim();
        let (names, ty) = match header.split_once(" : ") {
            Some((names, ty)) => (Some(names), ty),
            None => match header.strip_suffix(':').or_else(|| header.strip_suffix(" :")) {
                Some(names) => (Some(names), ""),
                None if section == Section::Returns => (None, header),
                None => (Some(header), ""),
            },
        };

        let ty = strip_qualifiers(ty.trim()).ty;
        if ty.is_empty() {
            continue;
        }
        match names {
            Some(names) => {
                for name in names.split(',') {
                    let name = name.trim().trim_start_matches('*');
                    if !name.is_empty() {
                        entries.insert(name.to_string(), ty.clone());
                    }
                }
            }
            None => {
                entries.insert(ordinal.to_string(), ty);
            }
        }
        ordinal += 1;
    }
}

/// Clean up indentation the way Python's `inspect.cleandoc` does.
///
/// Tabs are expanded, the first line is stripped of leading whitespace,
/// the common indentation of the remaining lines is removed, and blank
/// lines at either end are dropped.
pub fn clean_docstring(text: &str) -> String {
    let expanded = text.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let margin = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.push(first.trim_start());
    for line in rest {
        if line.trim().is_empty() {
            out.push("");
        } else {
            out.push(line.get(margin..).unwrap_or_else(|| line.trim_start()));
        }
    }

    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}
