//! Stub detector
//!
//! A node is a stub iff its direct body is exactly one statement and that
//! statement is the bare placeholder. Nested declarations are never looked
//! through.

use crate::merge::MergeKind;
use crate::parser::ast::{Category, Kind, StatementNode};

/// The statement is the placeholder marker and nothing else: no trailing
/// comment, no comment lines attached
pub fn is_placeholder(node: &StatementNode, marker: &str) -> bool {
    node.kind == Kind::Data
        && node.category == Category::Simple
        && node.header == marker
        && !node.has_commentary()
}

pub fn is_stub(node: &StatementNode, marker: &str) -> bool {
    match node.body.as_slice() {
        [only] => is_placeholder(only, marker),
        _ => false,
    }
}

/// Merge kind of a stub declaration; `None` for anything else
pub fn stub_kind(node: &StatementNode, marker: &str) -> Option<MergeKind> {
    if is_stub(node, marker) {
        MergeKind::from_kind(node.kind)
    } else {
        None
    }
}
