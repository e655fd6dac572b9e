//! Outline tokenizer: groups declaration text into logical lines
//!
//! Handles: indentation (tabs expand to 8-column stops), blank-line runs,
//! bracketed continuation, backslash continuation, string literals
//! (single, double, triple-quoted), and trailing `#` comments.
//!
//! A logical line is the unit the outline reader works with: one statement
//! header or simple statement, however many physical lines it spans.
//!
//! Guarantees:
//! - Deterministic: same input always produces same line stream
//! - line:column for every error

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const TAB_WIDTH: usize = 8;

/// Position in source text for error reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Span {
            line,
            column,
            offset,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One statement's worth of source text
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Indentation width of the first physical line
    pub indent: usize,
    /// Code with the first line's indentation removed and the trailing
    /// comment split off. Continuation lines keep their indentation
    /// relative to `indent`; rows inside a string literal are kept as
    /// written.
    pub text: String,
    /// Trailing comment, `#` included
    pub comment: Option<String>,
    /// Byte offset in `text` of the first `:` outside brackets and strings
    /// (`:=` excluded)
    pub block_colon: Option<usize>,
    /// Blank physical lines directly above this line
    pub blank_before: usize,
    /// The physical lines exactly as written
    pub raw: Vec<String>,
    pub span: Span,
}

impl LogicalLine {
    /// A line holding nothing but a comment
    pub fn is_comment_only(&self) -> bool {
        self.text.is_empty() && self.comment.is_some()
    }

    /// The colon ends the code text, so the statement's body follows on
    /// indented lines
    pub fn opens_block(&self) -> bool {
        matches!(self.block_colon, Some(pos) if pos + 1 == self.text.len())
    }
}

/// Tokenizer for declaration source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Tokenizer {
    /// Create a new tokenizer; CRLF and lone CR line endings become LF
    pub fn new(text: &str) -> Self {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Split the entire input into logical lines
    pub fn tokenize(&mut self) -> Result<Vec<LogicalLine>> {
        let mut lines = Vec::new();
        let mut blank_run = 0;

        while !self.is_at_end() {
            let line_start = self.position;
            let span = self.current_span();
            let indent = self.read_indent();

            match self.peek() {
                None => break,
                Some('\n') => {
                    self.advance();
                    blank_run += 1;
                    continue;
                }
                _ => {}
            }

            let mut line = self.read_logical_line(indent, span)?;
            line.blank_before = blank_run;
            line.raw = self.raw_lines(line_start);
            blank_run = 0;
            lines.push(line);
        }

        Ok(lines)
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span::new(self.line, self.column, self.position)
    }

    fn raw_lines(&self, start: usize) -> Vec<String> {
        let raw: String = self.input[start..self.position].iter().collect();
        raw.strip_suffix('\n')
            .unwrap_or(&raw)
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    // ── Indentation ────────────────────────────────────────

    fn read_indent(&mut self) -> usize {
        let mut width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }
        width
    }

    /// Start the next physical line of a logical line, keeping its
    /// indentation relative to the logical line's first line
    fn continue_line(&mut self, text: &mut String, base: usize) {
        while text.ends_with(' ') || text.ends_with('\t') {
            text.pop();
        }
        text.push('\n');
        let width = self.read_indent();
        if !matches!(self.peek(), Some('\n') | None) {
            text.extend(std::iter::repeat(' ').take(width.saturating_sub(base)));
        }
    }

    // ── Logical lines ──────────────────────────────────────

    fn read_logical_line(&mut self, indent: usize, span: Span) -> Result<LogicalLine> {
        let mut text = String::new();
        let mut comment = None;
        let mut block_colon = None;
        let mut brackets: Vec<(char, Span)> = Vec::new();

        loop {
            let Some(ch) = self.peek() else {
                if let Some((open, at)) = brackets.last() {
                    return Err(Error::parse(format!("Unclosed '{}'", open), *at));
                }
                break;
            };

            match ch {
                '\n' => {
                    self.advance();
                    if brackets.is_empty() {
                        break;
                    }
                    self.continue_line(&mut text, indent);
                }
                '\\' if self.peek_ahead(1) == Some('\n') => {
                    text.push('\\');
                    self.advance();
                    self.advance();
                    self.continue_line(&mut text, indent);
                }
                '#' => {
                    let body = self.read_to_line_end();
                    if brackets.is_empty() {
                        comment = Some(body);
                    } else {
                        text.push_str(&body);
                    }
                }
                '"' | '\'' => self.read_string(ch, &mut text)?,
                '(' | '[' | '{' => {
                    brackets.push((ch, self.current_span()));
                    text.push(ch);
                    self.advance();
                }
                ')' | ']' | '}' => {
                    let at = self.current_span();
                    match brackets.pop() {
                        Some((open, _)) if closes(open, ch) => {}
                        _ => return Err(Error::parse(format!("Unmatched '{}'", ch), at)),
                    }
                    text.push(ch);
                    self.advance();
                }
                ':' if brackets.is_empty()
                    && block_colon.is_none()
                    && self.peek_ahead(1) != Some('=') =>
                {
                    block_colon = Some(text.len());
                    text.push(ch);
                    self.advance();
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        let text = text.trim_end().to_string();
        Ok(LogicalLine {
            indent,
            text,
            comment,
            block_colon,
            blank_before: 0,
            raw: Vec::new(),
            span,
        })
    }

    fn read_to_line_end(&mut self) -> String {
        let mut body = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            body.push(ch);
            self.advance();
        }
        body.trim_end().to_string()
    }

    // ── String literals ────────────────────────────────────

    /// Copy a string literal into `text` exactly as written; lines inside
    /// a triple-quoted string are never re-indented or trimmed
    fn read_string(&mut self, quote: char, text: &mut String) -> Result<()> {
        let start = self.current_span();
        let triple = self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote);
        let delimiter = if triple { 3 } else { 1 };
        for _ in 0..delimiter {
            text.push(quote);
            self.advance();
        }

        loop {
            match self.peek() {
                None => return Err(Error::parse("Unterminated string", start)),
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    match self.advance() {
                        Some(c) => text.push(c),
                        None => return Err(Error::parse("Unterminated string", start)),
                    }
                }
                Some('\n') => {
                    if !triple {
                        return Err(Error::parse("Unterminated string", start));
                    }
                    text.push('\n');
                    self.advance();
                }
                Some(c) if c == quote => {
                    let closing = !triple
                        || (self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote));
                    if closing {
                        for _ in 0..delimiter {
                            text.push(quote);
                            self.advance();
                        }
                        return Ok(());
                    }
                    text.push(c);
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }
}

fn closes(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// Rows of `text` (split on `\n`) that begin inside a string literal.
/// Such rows are literal content and are reproduced byte-for-byte.
pub fn literal_rows(text: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut rows = Vec::new();
    let mut row = 0;
    let mut open: Option<(char, bool)> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match open {
            None => match ch {
                '#' => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '"' | '\'' => {
                    let triple = chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch);
                    open = Some((ch, triple));
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '\n' => row += 1,
                _ => {}
            },
            Some((quote, triple)) => match ch {
                '\\' => {
                    if chars.get(i + 1) == Some(&'\n') {
                        row += 1;
                        rows.push(row);
                    }
                    i += 2;
                    continue;
                }
                '\n' => {
                    row += 1;
                    rows.push(row);
                }
                c if c == quote => {
                    if !triple {
                        open = None;
                    } else if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                        open = None;
                        i += 3;
                        continue;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    rows
}

/// Strip up to `width` columns of leading whitespace from a physical line.
/// A tab that overshoots the cut leaves the remainder as spaces.
pub fn dedent(line: &str, width: usize) -> String {
    let mut column = 0;
    let mut cut = line.len();
    for (i, ch) in line.char_indices() {
        if column >= width || !(ch == ' ' || ch == '\t') {
            cut = i;
            break;
        }
        column = if ch == '\t' {
            (column / TAB_WIDTH + 1) * TAB_WIDTH
        } else {
            column + 1
        };
    }
    let overshoot = column.saturating_sub(width);
    let rebased = format!("{}{}", " ".repeat(overshoot), &line[cut..]);
    rebased.trim_end().to_string()
}
