//! Helpers for documented type phrases.

/// Split `text` on any of `separators` that appear outside brackets and
/// string quotes. Parts are trimmed; empty parts are dropped.
pub fn split_top_level<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && separators.contains(&c) => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// A type phrase with its trailing qualifiers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub ty: String,
    /// The phrase carried a `default=None` qualifier.
    pub default_none: bool,
}

/// Remove `, optional` and `, default ...` qualifiers from a type phrase.
///
/// Everything from the first top-level qualifier on is dropped:
/// `int or None, default=None` becomes `int or None`.
pub fn strip_qualifiers(phrase: &str) -> Stripped {
    let mut kept = Vec::new();
    let mut default_none = false;

    for part in split_top_level(phrase, &[',']) {
        let lower = part.to_ascii_lowercase();
        if lower == "optional" {
            break;
        }
        if let Some(rest) = lower
            .strip_prefix("default")
            .filter(|r| r.is_empty() || r.starts_with([' ', '=', ':']))
        {
            let value = rest.trim_start_matches([' ', '=', ':']).trim();
            default_none = value == "none";
            break;
        }
        kept.push(part);
    }

    Stripped {
        ty: kept.join(", "),
        default_none,
    }
}
