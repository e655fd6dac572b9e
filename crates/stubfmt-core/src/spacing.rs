//! Blank-line arbiter: the 0/1 decision table
//!
//! | Boundary      | Blank lines                                                   |
//! |---------------|---------------------------------------------------------------|
//! | FirstInSuite  | 0                                                             |
//! | Sibling       | 0 if both are stubs of the same merge kind, else 1            |
//! | Entry         | 0 if the previous stub matches the Compound, else source (≤1) |
//! |               | 1 before an unsupported construct                             |
//! | PairedClause  | 0 if the whole Compound resolves to a merge kind, else 1      |
//! | SuiteExit     | 1 (nothing is emitted when no sibling follows)                |
//!
//! Every result is capped by `FormatConfig::max_blank_lines`.

use crate::config::FormatConfig;
use crate::merge::MergeKind;
use crate::parser::ast::Kind;

/// What the arbiter needs to know about one rendered statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemProfile {
    pub kind: Kind,
    pub is_stub: bool,
    pub merge_kind: Option<MergeKind>,
    /// False for block openers the normalizer does not recognise
    pub supported: bool,
}

impl ItemProfile {
    pub fn data() -> Self {
        ItemProfile {
            kind: Kind::Data,
            is_stub: false,
            merge_kind: None,
            supported: true,
        }
    }
}

/// Structural context of a boundary between two adjacent items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    FirstInSuite,
    Sibling {
        prev: ItemProfile,
        next: ItemProfile,
    },
    Entry {
        prev: ItemProfile,
        compound: Option<MergeKind>,
        supported: bool,
        original_blank: usize,
    },
    PairedClause {
        compound: Option<MergeKind>,
    },
    SuiteExit {
        has_next: bool,
    },
}

/// Pick the boundary context for `next` given what precedes it in its block
pub fn boundary_before(
    prev: Option<&ItemProfile>,
    next: &ItemProfile,
    original_blank: usize,
) -> Boundary {
    let Some(prev) = prev else {
        return Boundary::FirstInSuite;
    };
    if prev.kind == Kind::Compound {
        Boundary::SuiteExit { has_next: true }
    } else if next.kind == Kind::Compound {
        Boundary::Entry {
            prev: *prev,
            compound: next.merge_kind,
            supported: next.supported,
            original_blank,
        }
    } else {
        Boundary::Sibling {
            prev: *prev,
            next: *next,
        }
    }
}

/// Blank lines to emit at a boundary
pub fn blank_lines(boundary: &Boundary, config: &FormatConfig) -> usize {
    let wanted = match *boundary {
        Boundary::FirstInSuite => 0,
        Boundary::Sibling { prev, next } => {
            let merges = prev.is_stub
                && next.is_stub
                && prev.merge_kind.is_some()
                && prev.merge_kind == next.merge_kind;
            if merges {
                0
            } else {
                1
            }
        }
        Boundary::Entry {
            prev,
            compound,
            supported,
            original_blank,
        } => {
            if !supported {
                1
            } else if prev.is_stub && compound.is_some() && prev.merge_kind == compound {
                0
            } else {
                original_blank.min(1)
            }
        }
        Boundary::PairedClause { compound } => {
            if compound.is_some() {
                0
            } else {
                1
            }
        }
        Boundary::SuiteExit { has_next } => usize::from(has_next),
    };
    wanted.min(config.max_blank_lines)
}
