//! This module handles conversion between iCal files and [`Component`](crate::component::Component)s
//!
//! It is a wrapper around two Rust third-party libraries: `ical` parses iCal files, `ics` generates them.

mod parser;
pub use parser::parse;
mod builder;
pub use builder::build_from;

use crate::config::{ORG_NAME, PRODUCT_NAME};

pub fn default_prod_id() -> String {
    let org = ORG_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    let product = PRODUCT_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    format!("-//{}//{}//EN", org, product)
}

/// Escape a TEXT value (RFC5545 section 3.3.11)
pub(crate) fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => continue,
            c => escaped.push(c),
        }
    }
    escaped
}

pub(crate) fn unescape_text(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
