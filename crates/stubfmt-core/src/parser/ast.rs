//! Statement tree types
//!
//! A declaration file is a [`Block`] of [`StatementNode`]s. Nodes own their
//! body blocks and paired clauses exclusively; the tree is built once by the
//! outline reader and only read afterwards.
//!
//! All tree types derive Debug, Clone, PartialEq, Serialize, Deserialize.

use serde::{Deserialize, Serialize};

use crate::classify;
use crate::parser::tokenizer::Span;

/// An ordered sequence of statements. Order is significant and never changed.
pub type Block = Vec<StatementNode>;

/// Spacing-relevant classification of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Data,
    FunctionLike,
    TypeLike,
    Compound,
}

/// Syntactic category reported by the outline reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Class,
    Def,
    If,
    While,
    For,
    Try,
    With,
    /// Block opener whose keyword is not recognised
    Unknown,
    /// Simple statement (assignment, annotation, expression, import, ...)
    Simple,
    /// Standalone comment lines with no statement after them
    Comment,
    /// `# fmt: off` region, passed through unchanged
    Verbatim,
}

/// A declaration or simple statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementNode {
    pub kind: Kind,
    pub category: Category,
    /// Pre-rendered header (or full text, for Data); may span physical lines
    pub header: String,
    pub body: Block,
    pub clauses: Vec<PairedClause>,
    /// Blank lines above this statement in the source
    pub blank_before: usize,
    /// Decoration marker lines (`@...`), rendered above the header
    pub decorators: Vec<String>,
    /// Standalone comment lines directly above the statement
    pub leading_comments: Vec<String>,
    /// Comment on the header's own line
    pub trailing_comment: Option<String>,
    pub span: Span,
}

/// An alternative/continuation branch of a Compound statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedClause {
    pub header: String,
    pub body: Block,
    pub leading_comments: Vec<String>,
    pub trailing_comment: Option<String>,
    pub span: Span,
}

impl StatementNode {
    /// Node of the given category; the kind comes from the classifier
    pub fn new(category: Category, header: impl Into<String>) -> Self {
        StatementNode {
            kind: classify::kind_of(category),
            category,
            header: header.into(),
            body: Vec::new(),
            clauses: Vec::new(),
            blank_before: 0,
            decorators: Vec::new(),
            leading_comments: Vec::new(),
            trailing_comment: None,
            span: Span::default(),
        }
    }

    /// Simple statement with no body
    pub fn simple(text: impl Into<String>) -> Self {
        Self::new(Category::Simple, text)
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = body;
        self
    }

    pub fn with_clause(mut self, clause: PairedClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn with_blank_before(mut self, blank_before: usize) -> Self {
        self.blank_before = blank_before;
        self
    }

    pub fn with_decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorators.push(decorator.into());
        self
    }

    pub fn with_trailing_comment(mut self, comment: impl Into<String>) -> Self {
        self.trailing_comment = Some(comment.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_decoration_markers(&self) -> bool {
        !self.decorators.is_empty()
    }

    /// Any comment owned by this node itself
    pub fn has_commentary(&self) -> bool {
        !self.leading_comments.is_empty() || self.trailing_comment.is_some()
    }

    /// Primary body followed by every clause body, in source order
    pub fn bodies(&self) -> impl Iterator<Item = &Block> {
        std::iter::once(&self.body).chain(self.clauses.iter().map(|c| &c.body))
    }
}

impl PairedClause {
    pub fn new(header: impl Into<String>, body: Block) -> Self {
        PairedClause {
            header: header.into(),
            body,
            leading_comments: Vec::new(),
            trailing_comment: None,
            span: Span::default(),
        }
    }
}
