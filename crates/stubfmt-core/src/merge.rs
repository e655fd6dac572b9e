//! Mergeability resolver
//!
//! Reduces a statement to the synthetic kind used for spacing comparisons.
//! A Compound resolves to a kind only when every clause body, primary body
//! included, is a single stub of that kind or a single Compound resolving
//! to it. The result never affects spacing after the Compound.

use serde::{Deserialize, Serialize};

use crate::classify;
use crate::parser::ast::{Kind, StatementNode};
use crate::stub;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeKind {
    FunctionLike,
    TypeLike,
}

impl MergeKind {
    pub fn from_kind(kind: Kind) -> Option<Self> {
        match kind {
            Kind::FunctionLike => Some(MergeKind::FunctionLike),
            Kind::TypeLike => Some(MergeKind::TypeLike),
            Kind::Data | Kind::Compound => None,
        }
    }
}

/// Merge kind of any statement
pub fn merge_kind(node: &StatementNode, marker: &str) -> Option<MergeKind> {
    match node.kind {
        Kind::Compound => resolve_compound(node, marker),
        _ => stub::stub_kind(node, marker),
    }
}

/// Uniform merge kind of a Compound's whole clause chain
pub fn resolve_compound(node: &StatementNode, marker: &str) -> Option<MergeKind> {
    if node.kind != Kind::Compound || !classify::is_supported(node.category) {
        return None;
    }

    let mut resolved = None;
    for body in node.bodies() {
        let [only] = body.as_slice() else {
            return None;
        };
        let kind = merge_kind(only, marker)?;
        match resolved {
            None => resolved = Some(kind),
            Some(previous) if previous == kind => {}
            Some(_) => return None,
        }
    }
    resolved
}
