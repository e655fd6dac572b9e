//! Tree verifier: structure and output safety checks
//!
//! Two passes guard the normalizer:
//!
//! 1. **Structure** (before walking): every declaration and Compound owns a
//!    non-empty body, Data statements own none, clauses hang only off
//!    Compounds. A violation is an upstream defect, reported as
//!    [`Error::StructuralInvariant`]. Unsupported constructs are reported as
//!    warnings and formatted conservatively.
//! 2. **Safety** (after formatting): the output must format to itself and
//!    must carry the same statement skeleton as the input.
//!
//! The structural pass accumulates all diagnostics rather than stopping at
//! the first one.

use crate::classify;
use crate::config::FormatConfig;
use crate::normalizer;
use crate::parser;
use crate::parser::ast::{Block, Category, Kind, StatementNode};
use crate::parser::tokenizer::Span;
use crate::stub;
use crate::{Error, Result};

// ── Verification Result Types ─────────────────────────────

/// Result of structural verification: accumulates all diagnostics
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl VerificationResult {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Returns true if no errors were found (warnings are OK)
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Returns only error-level diagnostics
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect()
    }

    /// Returns only warning-level diagnostics
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }

    /// Fold the errors into one `StructuralInvariant`; warnings pass
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let messages: Vec<String> = self.errors().iter().map(|d| d.to_string()).collect();
        Err(Error::StructuralInvariant(messages.join("; ")))
    }

    fn add_error(&mut self, kind: DiagnosticKind, message: String, span: Option<Span>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message,
            span,
        });
    }

    fn add_warning(&mut self, kind: DiagnosticKind, message: String, span: Option<Span>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message,
            span,
        });
    }
}

impl Default for VerificationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// A single verification diagnostic
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<Span>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if let Some(ref span) = self.span {
            write!(f, "{} [{}] at {}: {}", prefix, self.kind, span, self.message)
        } else {
            write!(f, "{} [{}]: {}", prefix, self.kind, self.message)
        }
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Category of verification issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    DataWithBody,
    MissingBody,
    StrayClauses,
    EmptyClause,
    UnsupportedConstruct,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DiagnosticKind::DataWithBody => write!(f, "data-body"),
            DiagnosticKind::MissingBody => write!(f, "missing-body"),
            DiagnosticKind::StrayClauses => write!(f, "stray-clause"),
            DiagnosticKind::EmptyClause => write!(f, "empty-clause"),
            DiagnosticKind::UnsupportedConstruct => write!(f, "unsupported"),
        }
    }
}

// ── Structure ─────────────────────────────────────────────

/// Check the tree invariants the walker relies on
pub fn verify_structure(block: &Block) -> VerificationResult {
    let mut result = VerificationResult::new();
    verify_block(block, &mut result);
    result
}

fn verify_block(block: &Block, result: &mut VerificationResult) {
    for node in block {
        verify_node(node, result);
        for body in node.bodies() {
            verify_block(body, result);
        }
    }
}

fn verify_node(node: &StatementNode, result: &mut VerificationResult) {
    let span = Some(node.span);
    let name = first_line(&node.header);

    if classify::has_body(node.kind) {
        if node.body.is_empty() {
            result.add_error(
                DiagnosticKind::MissingBody,
                format!("'{}' has no body", name),
                span,
            );
        }
    } else if !node.body.is_empty() {
        result.add_error(
            DiagnosticKind::DataWithBody,
            format!("'{}' is a simple statement but owns a body", name),
            span,
        );
    }

    if node.kind != Kind::Compound && !node.clauses.is_empty() {
        result.add_error(
            DiagnosticKind::StrayClauses,
            format!("'{}' cannot own clauses", name),
            span,
        );
    }

    for clause in &node.clauses {
        if clause.body.is_empty() {
            result.add_error(
                DiagnosticKind::EmptyClause,
                format!("clause '{}' has no body", first_line(&clause.header)),
                Some(clause.span),
            );
        }
    }

    if node.kind == Kind::Compound && !classify::is_supported(node.category) {
        result.add_warning(
            DiagnosticKind::UnsupportedConstruct,
            format!("'{}' is not a recognised block; kept apart from its neighbours", name),
            span,
        );
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

// ── Safety ────────────────────────────────────────────────

/// Depth-annotated statement texts, in order. A stub's placeholder is
/// folded into its owner's entry, so collapsing a stub does not change the
/// skeleton while any reordering or content change does. Blank lines
/// between comments are not part of it.
pub fn skeleton(block: &Block, marker: &str) -> Vec<String> {
    let mut entries = Vec::new();
    skeleton_block(block, 0, marker, &mut entries);
    entries
}

fn skeleton_block(block: &Block, depth: usize, marker: &str, out: &mut Vec<String>) {
    for node in block {
        push_comments(out, depth, node.leading_comments.iter().map(String::as_str));
        if node.category == Category::Comment {
            push_comments(out, depth, node.header.split('\n'));
            continue;
        }
        for decorator in &node.decorators {
            out.push(format!("{}:{}", depth, decorator));
        }

        let header = with_comment(&node.header, node.trailing_comment.as_deref());
        if node.kind != Kind::Compound && stub::is_stub(node, marker) {
            out.push(format!("{}:{} {}", depth, header, marker));
            continue;
        }

        out.push(format!("{}:{}", depth, header));
        skeleton_block(&node.body, depth + 1, marker, out);
        for clause in &node.clauses {
            push_comments(out, depth, clause.leading_comments.iter().map(String::as_str));
            let header = with_comment(&clause.header, clause.trailing_comment.as_deref());
            out.push(format!("{}:{}", depth, header));
            skeleton_block(&clause.body, depth + 1, marker, out);
        }
    }
}

fn push_comments<'c>(out: &mut Vec<String>, depth: usize, comments: impl Iterator<Item = &'c str>) {
    for comment in comments.filter(|comment| !comment.is_empty()) {
        out.push(format!("{}:{}", depth, comment));
    }
}

fn with_comment(text: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("{}  {}", text, comment),
        None => text.to_string(),
    }
}

/// Check that `dst` is a stable, equivalent formatting of `src`
///
/// # Errors
/// `Unstable` if formatting `dst` again changes it; `NotEquivalent` if `dst`
/// does not parse or its skeleton differs from the source's.
pub fn check_stability_and_equivalence(
    src: &str,
    dst: &str,
    config: &FormatConfig,
) -> Result<()> {
    let marker = config.placeholder.as_str();

    let src_tree = parser::parse(src)?;
    let dst_tree = parser::parse(dst).map_err(|e| {
        Error::NotEquivalent(format!("formatted output does not parse: {}", e))
    })?;

    let expected = skeleton(&src_tree, marker);
    let actual = skeleton(&dst_tree, marker);
    if expected != actual {
        let at = expected
            .iter()
            .zip(&actual)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| expected.len().min(actual.len()));
        return Err(Error::NotEquivalent(format!(
            "statement {} differs: source {:?}, formatted {:?}",
            at + 1,
            expected.get(at),
            actual.get(at)
        )));
    }

    let again = normalizer::format_str(dst, config)?;
    if again != dst {
        let line = dst
            .lines()
            .zip(again.lines())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| dst.lines().count().min(again.lines().count()));
        return Err(Error::Unstable(format!(
            "second pass changed the output at line {}",
            line + 1
        )));
    }

    tracing::debug!(statements = expected.len(), "safety check passed");
    Ok(())
}
