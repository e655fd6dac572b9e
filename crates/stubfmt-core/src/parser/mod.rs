//! Outline reader: builds the statement tree from declaration text
//!
//! Converts declaration-file text into a [`Block`] of statements. Only the
//! outline is understood: block openers, their clauses, decoration markers
//! and comments. Everything else is carried as opaque statement text.
//!
//! `# fmt: off` / `# fmt: on` regions are read as a single verbatim
//! statement and never reformatted. So is a simple statement whose trailing
//! comment is `# fmt: skip`.

pub mod ast;
pub mod tokenizer;

use crate::parser::ast::{Block, Category, PairedClause, StatementNode};
use crate::parser::tokenizer::{dedent, literal_rows, LogicalLine, Span, Tokenizer};
use crate::{Error, Result};

const FMT_OFF: [&str; 3] = ["# fmt: off", "# fmt:off", "# yapf: disable"];
const FMT_ON: [&str; 3] = ["# fmt: on", "# fmt:on", "# yapf: enable"];
const FMT_SKIP: [&str; 2] = ["# fmt: skip", "# fmt:skip"];

/// Parse declaration text into its statement tree
///
/// # Guarantees
/// - Deterministic: same input always produces same tree
/// - Statement order is exactly source order
///
/// # Errors
/// Returns `Error::Parse` with line:column for indentation and bracket
/// violations, clauses without an owner, and dangling decorators.
pub fn parse(input: &str) -> Result<Block> {
    let lines = Tokenizer::new(input).tokenize()?;
    let mut reader = Reader::new(&lines);
    let block = reader.parse_block(0)?;
    tracing::trace!(statements = block.len(), lines = lines.len(), "parsed outline");
    Ok(block)
}

/// Comments and decorators seen before the statement they belong to
#[derive(Debug, Default)]
struct Pending {
    blank_before: Option<usize>,
    span: Option<Span>,
    comments: Vec<String>,
    decorators: Vec<String>,
}

impl Pending {
    fn note(&mut self, line: &LogicalLine) {
        if self.blank_before.is_none() {
            self.blank_before = Some(line.blank_before);
            self.span = Some(line.span);
        }
    }

    fn comment(&mut self, line: &LogicalLine) {
        self.note(line);
        let text = line.comment.clone().unwrap_or_default();
        // a comment between a decorator and its declaration stays in place
        if self.decorators.is_empty() {
            // an empty entry marks blank lines between two comment groups
            if !self.comments.is_empty() && line.blank_before > 0 {
                self.comments.push(String::new());
            }
            self.comments.push(text);
        } else {
            self.decorators.push(text);
        }
    }

    fn decorator(&mut self, line: &LogicalLine) {
        self.note(line);
        self.decorators.push(with_comment(&line.text, &line.comment));
    }

    fn take(&mut self) -> Pending {
        std::mem::take(self)
    }

    fn reject_decorators(&self) -> Result<()> {
        if self.decorators.is_empty() {
            return Ok(());
        }
        Err(Error::parse(
            "Decorator must be followed by a class or function declaration",
            self.span.unwrap_or_default(),
        ))
    }

    /// Move the collected commentary onto the statement it precedes
    fn attach(self, node: &mut StatementNode, line: &LogicalLine) {
        node.blank_before = self.blank_before.unwrap_or(line.blank_before);
        node.leading_comments = self.comments;
        node.decorators = self.decorators;
    }
}

struct Reader<'a> {
    lines: &'a [LogicalLine],
    position: usize,
    /// Indentation of every block currently open, outermost first
    indents: Vec<usize>,
}

impl<'a> Reader<'a> {
    fn new(lines: &'a [LogicalLine]) -> Self {
        Reader {
            lines,
            position: 0,
            indents: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a LogicalLine> {
        self.lines.get(self.position)
    }

    fn advance(&mut self) -> Option<&'a LogicalLine> {
        let line = self.lines.get(self.position);
        if line.is_some() {
            self.position += 1;
        }
        line
    }

    /// Indentation of the next line that carries code
    fn next_code_indent(&self) -> Option<usize> {
        self.lines[self.position..]
            .iter()
            .find(|line| !line.is_comment_only())
            .map(|line| line.indent)
    }

    /// A comment line belongs to the block at `indent` when it is indented
    /// at least that far, or when the code after it still is
    fn comment_belongs(&self, line: &LogicalLine, indent: usize) -> bool {
        line.indent >= indent || self.next_code_indent().map_or(false, |next| next >= indent)
    }

    // ── Blocks ─────────────────────────────────────────────

    fn parse_block(&mut self, indent: usize) -> Result<Block> {
        self.indents.push(indent);
        let block = self.read_statements(indent);
        self.indents.pop();
        block
    }

    fn read_statements(&mut self, indent: usize) -> Result<Block> {
        let mut block: Block = Vec::new();
        let mut pending = Pending::default();

        while let Some(line) = self.peek() {
            if line.is_comment_only() {
                if !self.comment_belongs(line, indent) {
                    break;
                }
                if is_marker(line, &FMT_OFF) {
                    pending.reject_decorators()?;
                    let node = self.read_verbatim(indent, pending.take())?;
                    block.push(node);
                } else {
                    pending.comment(line);
                    self.position += 1;
                }
                continue;
            }

            if line.indent < indent {
                if !self.indents.contains(&line.indent) {
                    return Err(Error::parse(
                        "Unindent does not match any outer indentation level",
                        line.span,
                    ));
                }
                break;
            }
            if line.indent > indent {
                return Err(Error::parse("Unexpected indent", line.span));
            }

            if line.text.starts_with('@') {
                pending.decorator(line);
                self.position += 1;
                continue;
            }

            if let Some(keyword) = clause_keyword(&line.text) {
                pending.reject_decorators()?;
                let accepted = block
                    .last()
                    .map_or(false, |owner| accepts_clause(owner, keyword));
                if !accepted {
                    return Err(Error::parse(
                        format!("'{}' without a matching statement", keyword),
                        line.span,
                    ));
                }
                let clause = self.parse_clause(indent, pending.take())?;
                if let Some(owner) = block.last_mut() {
                    owner.clauses.push(clause);
                }
                continue;
            }

            let node = self.parse_statement(indent, pending.take())?;
            block.push(node);
        }

        pending.reject_decorators()?;
        if !pending.comments.is_empty() {
            let comments = pending.comments.join("\n");
            let node = StatementNode::new(Category::Comment, comments)
                .with_blank_before(pending.blank_before.unwrap_or(0))
                .with_span(pending.span.unwrap_or_default());
            block.push(node);
        }
        Ok(block)
    }

    /// Body of a block opener: the deeper-indented lines that follow it
    fn parse_body(&mut self, indent: usize, header: &LogicalLine) -> Result<Block> {
        match self.next_code_indent() {
            Some(body_indent) if body_indent > indent => self.parse_block(body_indent),
            _ => Err(Error::parse("Expected an indented block", header.span)),
        }
    }

    // ── Statements ─────────────────────────────────────────

    fn parse_statement(&mut self, indent: usize, pending: Pending) -> Result<StatementNode> {
        let Some(line) = self.advance() else {
            return Err(Error::parse("Unexpected end of input", Span::default()));
        };

        let category = block_category(&line.text);
        let mut node = match category {
            _ if is_skipped(line, category) => {
                tracing::debug!(line = line.span.line, "formatting skipped for statement");
                StatementNode::new(Category::Verbatim, rebase(line, indent).join("\n"))
            }
            Some(category) => {
                let (header, body, trailing) = self.read_suite(indent, line)?;
                let mut node = StatementNode::new(category, header).with_body(body);
                node.trailing_comment = trailing;
                node
            }
            None if line.opens_block() => {
                tracing::debug!(
                    line = line.span.line,
                    header = %line.text,
                    "unrecognised block opener, keeping it apart from its neighbours"
                );
                let body = self.parse_body(indent, line)?;
                let mut node = StatementNode::new(Category::Unknown, line.text.clone()).with_body(body);
                node.trailing_comment = line.comment.clone();
                node
            }
            None => {
                let mut node = StatementNode::simple(line.text.clone());
                node.trailing_comment = line.comment.clone();
                node
            }
        };

        let declaration = matches!(category, Some(Category::Class | Category::Def));
        if !pending.decorators.is_empty() && !declaration {
            return Err(Error::parse(
                "Decorator must be followed by a class or function declaration",
                pending.span.unwrap_or(line.span),
            ));
        }
        node.span = line.span;
        pending.attach(&mut node, line);
        Ok(node)
    }

    fn parse_clause(&mut self, indent: usize, pending: Pending) -> Result<PairedClause> {
        let Some(line) = self.advance() else {
            return Err(Error::parse("Unexpected end of input", Span::default()));
        };
        let (header, body, trailing) = self.read_suite(indent, line)?;
        Ok(PairedClause {
            header,
            body,
            leading_comments: pending.comments,
            trailing_comment: trailing,
            span: line.span,
        })
    }

    /// Header, body and header comment of a keyword statement or clause.
    /// `def f(): ...` on one line yields the same body as the indented form;
    /// the line's comment then belongs to the inline statement.
    fn read_suite(
        &mut self,
        indent: usize,
        line: &'a LogicalLine,
    ) -> Result<(String, Block, Option<String>)> {
        let Some(colon) = line.block_colon else {
            return Err(Error::parse("Expected ':'", line.span));
        };
        let header = line.text[..=colon].to_string();

        if line.opens_block() {
            let body = self.parse_body(indent, line)?;
            return Ok((header, body, line.comment.clone()));
        }

        let mut inline = StatementNode::simple(line.text[colon + 1..].trim()).with_span(line.span);
        inline.trailing_comment = line.comment.clone();
        Ok((header, vec![inline], None))
    }

    // ── Verbatim regions ───────────────────────────────────

    /// Everything from `# fmt: off` up to the matching `# fmt: on` at the
    /// same indentation, or to the end of the enclosing block. A region that
    /// swallows a compound header also takes the clauses that follow it.
    fn read_verbatim(&mut self, indent: usize, pending: Pending) -> Result<StatementNode> {
        let Some(start) = self.advance() else {
            return Err(Error::parse("Unexpected end of input", Span::default()));
        };
        let mut text = rebase(start, indent);
        let mut opens_compound = false;

        while let Some(line) = self.peek() {
            let inside = if line.is_comment_only() {
                self.comment_belongs(line, indent)
            } else {
                line.indent >= indent
            };
            if !inside {
                break;
            }
            self.position += 1;
            push_region_line(&mut text, line, indent);
            if line.indent == indent && !line.is_comment_only() && clause_keyword(&line.text).is_none() {
                opens_compound = block_category(&line.text).map_or(false, takes_clauses);
            }
            if line.indent == indent && is_marker(line, &FMT_ON) {
                break;
            }
        }

        if opens_compound && self.clause_follows(indent) {
            self.read_clause_chain(indent, &mut text);
        }

        tracing::debug!(
            line = start.span.line,
            lines = text.len(),
            "formatting disabled for region"
        );
        let mut node = StatementNode::new(Category::Verbatim, text.join("\n")).with_span(start.span);
        pending.attach(&mut node, start);
        Ok(node)
    }

    /// Clauses at `indent` (and their bodies) continuing a compound whose
    /// header sits inside a verbatim region
    fn read_clause_chain(&mut self, indent: usize, text: &mut Vec<String>) {
        while let Some(line) = self.peek() {
            let take = if line.is_comment_only() {
                self.comment_belongs(line, indent + 1) || self.clause_follows(indent)
            } else if line.indent == indent {
                clause_keyword(&line.text).is_some()
            } else {
                line.indent > indent
            };
            if !take {
                break;
            }
            self.position += 1;
            push_region_line(text, line, indent);
        }
    }

    /// The next line carrying code is a clause at `indent`
    fn clause_follows(&self, indent: usize) -> bool {
        self.lines[self.position..]
            .iter()
            .find(|line| !line.is_comment_only())
            .map_or(false, |line| line.indent == indent && clause_keyword(&line.text).is_some())
    }
}

/// Physical lines of `line` with `width` columns of indentation removed.
/// Rows inside a string literal are kept exactly as written.
fn rebase(line: &LogicalLine, width: usize) -> Vec<String> {
    let literal = literal_rows(&line.raw.join("\n"));
    line.raw
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            if literal.binary_search(&row).is_ok() {
                raw.clone()
            } else {
                dedent(raw, width)
            }
        })
        .collect()
}

fn push_region_line(text: &mut Vec<String>, line: &LogicalLine, indent: usize) {
    text.extend(std::iter::repeat(String::new()).take(line.blank_before));
    text.extend(rebase(line, indent));
}

// ── Keywords ───────────────────────────────────────────────

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ':' | '(' | '['))
        .filter(|word| !word.is_empty())
}

/// Category of a keyword-introduced statement, `None` for anything else
fn block_category(text: &str) -> Option<Category> {
    let mut tokens = words(text);
    let first = tokens.next()?;
    let keyword = if first == "async" { tokens.next()? } else { first };
    let category = match keyword {
        "class" if first != "async" => Category::Class,
        "def" => Category::Def,
        "for" => Category::For,
        "with" => Category::With,
        "if" if first != "async" => Category::If,
        "while" if first != "async" => Category::While,
        "try" if first != "async" => Category::Try,
        _ => return None,
    };
    Some(category)
}

/// The clause keyword starting a line, if any
fn clause_keyword(text: &str) -> Option<&str> {
    let first = words(text).next()?;
    match first {
        "elif" | "else" | "except" | "except*" | "finally" => Some(first),
        _ => None,
    }
}

/// Whether `owner` can take another clause introduced by `keyword`
fn accepts_clause(owner: &StatementNode, keyword: &str) -> bool {
    let last = owner.clauses.last().and_then(|c| clause_keyword(&c.header));
    match owner.category {
        Category::If => matches!(keyword, "elif" | "else") && last != Some("else"),
        Category::For | Category::While => keyword == "else" && last.is_none(),
        Category::Try => {
            matches!(keyword, "except" | "except*" | "else" | "finally") && last != Some("finally")
        }
        _ => false,
    }
}

fn takes_clauses(category: Category) -> bool {
    matches!(
        category,
        Category::If | Category::For | Category::While | Category::Try
    )
}

/// A statement whose own line carries `# fmt: skip` is left as written.
/// Block openers keep their body formatted, and compounds that take
/// clauses are read normally.
fn is_skipped(line: &LogicalLine, category: Option<Category>) -> bool {
    let marked = line
        .comment
        .as_deref()
        .map_or(false, |comment| FMT_SKIP.contains(&comment));
    marked && !line.opens_block() && !category.map_or(false, takes_clauses)
}

fn is_marker(line: &LogicalLine, markers: &[&str]) -> bool {
    line.is_comment_only()
        && line
            .comment
            .as_deref()
            .map_or(false, |comment| markers.contains(&comment))
}

fn with_comment(text: &str, comment: &Option<String>) -> String {
    match comment {
        Some(comment) => format!("{}  {}", text, comment),
        None => text.to_string(),
    }
}
