//! Deterministic, textual fingerprinting of an operation call's cost-relevant
//! arguments.
//!
//! The dispatcher never sees the operation's real argument types — Rust has
//! no duck-typed "has a shape attribute" check the way the original Python
//! engine did — so the owning operation builds an [`ArgValue`] list itself
//! (see `liquid-engine::Operation::fingerprint_args`) and hands it to
//! [`fingerprint`].

#![forbid(unsafe_code)]

use std::fmt;

/// One positional or keyword argument, reduced to the parts of it that drive
/// backend cost.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// A scalar integer or floating-point argument.
    Number(f64),
    /// An argument with tensor-like dimensions (e.g. an image's shape).
    Shape(Vec<usize>),
    /// Anything else, kept as its printable form.
    Other(String),
}

impl ArgValue {
    fn render(&self) -> String {
        match self {
            ArgValue::Number(n) => format!("number({})", format_number(*n)),
            ArgValue::Shape(dims) => format!("shape({})", format_shape(dims)),
            ArgValue::Other(s) => s.clone(),
        }
    }
}

fn format_number(n: f64) -> String {
    // Rust's Display for f64 already collapses 4.0 -> "4", which is what we
    // want: a canonical, round-trippable decimal with no redundant zeros.
    format!("{}", n)
}

fn format_shape(dims: &[usize]) -> String {
    if dims.len() == 1 {
        // Match tuple-printing convention for a single-element tuple: "(3,)".
        format!("{},", dims[0])
    } else {
        dims.iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single keyword argument, rendered as `name: value`.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordArg {
    pub name: String,
    pub value: ArgValue,
}

impl KeywordArg {
    pub fn new(name: impl Into<String>, value: ArgValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Render a call's positional and keyword arguments into a canonical,
/// deterministic fingerprint string.
///
/// The exact format is this crate's own on-disk contract: it only needs to
/// be pure and stable across runs, not byte-compatible with any prior
/// implementation.
pub fn fingerprint(positional: &[ArgValue], keyword: &[KeywordArg]) -> String {
    let args = positional
        .iter()
        .map(ArgValue::render)
        .collect::<Vec<_>>()
        .join(", ");
    let kwargs = keyword
        .iter()
        .map(|kw| format!("{}: {}", kw.name, kw.value.render()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("([{}], {{{}}})", args, kwargs)
}

/// Extract every numeric dimension inside a `shape(...)` occurrence and every
/// scalar inside a `number(...)` occurrence, in document order.
///
/// This is a one-way extraction used only to score similarity between
/// fingerprints; it is not a reversible parse of the full fingerprint.
pub fn parse(fp: &str) -> (Vec<f64>, Vec<f64>) {
    (extract(fp, "shape("), extract(fp, "number("))
}

fn extract(text: &str, marker: &str) -> Vec<f64> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel_start) = text[cursor..].find(marker) {
        let start = cursor + rel_start + marker.len();
        let Some(rel_end) = text[start..].find(')') else {
            break;
        };
        let end = start + rel_end;
        let inner = &text[start..end];
        for part in inner.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Ok(value) = trimmed.parse::<f64>() {
                out.push(value);
            }
        }
        cursor = end + 1;
    }
    out
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_renders_without_trailing_zero() {
        assert_eq!(ArgValue::Number(4.0).render(), "number(4)");
        assert_eq!(ArgValue::Number(4.5).render(), "number(4.5)");
    }

    #[test]
    fn shape_keeps_trailing_comma_for_single_dim() {
        assert_eq!(ArgValue::Shape(vec![3]).render(), "shape(3,)");
        assert_eq!(ArgValue::Shape(vec![3, 64, 32]).render(), "shape(3, 64, 32)");
        assert_eq!(ArgValue::Shape(vec![]).render(), "shape()");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let args = vec![ArgValue::Shape(vec![3, 64, 32])];
        let kwargs = vec![KeywordArg::new("scale", ArgValue::Number(4.0))];
        let a = fingerprint(&args, &kwargs);
        let b = fingerprint(&args, &kwargs);
        assert_eq!(a, b);
        assert_eq!(a, "([shape(3, 64, 32)], {scale: number(4)})");
    }

    #[test]
    fn fingerprint_distinguishes_different_shapes() {
        let a = fingerprint(&[ArgValue::Shape(vec![3, 64, 32])], &[]);
        let b = fingerprint(&[ArgValue::Shape(vec![3, 128, 64])], &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn parse_recovers_shapes_and_numbers_in_order() {
        let fp = fingerprint(
            &[
                ArgValue::Shape(vec![3, 64, 32]),
                ArgValue::Shape(vec![3]),
                ArgValue::Number(4.0),
            ],
            &[KeywordArg::new("offset", ArgValue::Number(2.5))],
        );
        let (shapes, numbers) = parse(&fp);
        assert_eq!(shapes, vec![3.0, 64.0, 32.0, 3.0]);
        assert_eq!(numbers, vec![4.0, 2.5]);
    }

    #[test]
    fn parse_of_empty_call_is_empty() {
        let fp = fingerprint(&[], &[]);
        assert_eq!(fp, "([], {})");
        let (shapes, numbers) = parse(&fp);
        assert!(shapes.is_empty());
        assert!(numbers.is_empty());
    }

    #[test]
    fn other_argument_kept_as_printable_form() {
        let fp = fingerprint(&[ArgValue::Other("linear".to_string())], &[]);
        assert_eq!(fp, "([linear], {})");
    }
}
