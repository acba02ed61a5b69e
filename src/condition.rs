//! Presence tests for conditional template blocks.
//!
//! A template renderer decides per entry which optional blocks to keep,
//! e.g. a block marked `if url` is only shown for entries with a `url` field.
//! Only the decision lives here; templates themselves are up to the renderer.

use std::collections::HashSet;

use crate::types::BibEntry;

/// Marker word of a conditional block, ignored when testing its names
pub const CONDITION_MARKER: &str = "if";

/// Should a block requiring the fields `required` be kept, given the
/// fields in `present`? Names are compared case-insensitively.
/// A block without requirements is always kept.
pub fn keep_block<'r, 'p, R, P>(required: R, present: P) -> bool
where
    R: IntoIterator<Item = &'r str>,
    P: IntoIterator<Item = &'p str>,
{
    let present: HashSet<String> = present.into_iter().map(str::to_uppercase).collect();
    required
        .into_iter()
        .all(|name| present.contains(&name.to_uppercase()))
}

/// Test a whitespace-separated list of field names like `"if author year"`
/// against the fields of `entry`.
pub fn condition_holds(names: &str, entry: &BibEntry) -> bool {
    let required = names
        .split_whitespace()
        .filter(|name| !name.eq_ignore_ascii_case(CONDITION_MARKER));
    keep_block(required, entry.keys())
}
