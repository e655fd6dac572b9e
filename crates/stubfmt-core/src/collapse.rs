//! Collapse renderer: folds a stub's header and placeholder onto one line
//!
//! Only plain stubs fold: decorated declarations, headers carrying a
//! comment, and headers spanning several physical lines keep their
//! placeholder on its own line.

use crate::config::FormatConfig;
use crate::parser::ast::{Kind, StatementNode};
use crate::stub;

pub fn is_collapsible(node: &StatementNode, config: &FormatConfig) -> bool {
    config.collapse_stubs
        && matches!(node.kind, Kind::FunctionLike | Kind::TypeLike)
        && !node.has_decoration_markers()
        && node.trailing_comment.is_none()
        && !node.header.contains('\n')
        && stub::is_stub(node, &config.placeholder)
}

/// Header, one space, placeholder
pub fn collapse(header: &str, marker: &str) -> String {
    format!("{} {}", header.trim_end(), marker)
}
