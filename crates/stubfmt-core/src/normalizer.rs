//! Suite walker: renders a statement tree into its normalized line stream
//!
//! Depth-first and order-preserving. Every child of a block is classified
//! and stub-detected once, rendered (collapsed when eligible, otherwise
//! header plus recursively walked bodies), and then separated from its
//! predecessor by the number of blank lines the arbiter decides.
//!
//! # Pipeline
//!
//! `text → parse → verify_structure → normalize → lines → text`
//!
//! # Guarantees
//!
//! - **Idempotent**: `format_str(format_str(x)) == format_str(x)`
//! - **Deterministic**: same input always produces same output
//! - **Order preserving**: statements come out in source order at every depth
//! - **Content preserving**: only blank lines and stub collapse change

use sha2::{Digest, Sha256};

use crate::classify;
use crate::collapse;
use crate::config::FormatConfig;
use crate::merge::{self, MergeKind};
use crate::parser;
use crate::parser::tokenizer::literal_rows;
use crate::parser::ast::{Block, Category, Kind, PairedClause, StatementNode};
use crate::spacing::{self, Boundary, ItemProfile};
use crate::stub;
use crate::verifier;
use crate::Result;

/// One statement's rendered lines plus what the arbiter needs about it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedItem {
    pub lines: Vec<String>,
    pub kind: Kind,
    pub is_stub: bool,
    pub merge_kind: Option<MergeKind>,
    pub supported: bool,
}

impl RenderedItem {
    pub fn profile(&self) -> ItemProfile {
        ItemProfile {
            kind: self.kind,
            is_stub: self.is_stub,
            merge_kind: self.merge_kind,
            supported: self.supported,
        }
    }
}

// ── Public API ─────────────────────────────────────────────

/// Normalize a statement tree into its line stream. Blank lines are empty
/// strings; no line carries a newline.
pub fn normalize(block: &Block, config: &FormatConfig) -> Vec<String> {
    let mut lines = Vec::new();
    walk_block(block, 0, config, &mut lines);
    lines
}

/// Format declaration text
///
/// Pipeline: parse → verify structure → normalize → join
///
/// # Errors
/// Returns `Config` for invalid parameters, `Parse` for unreadable input,
/// and `StructuralInvariant` for a malformed tree.
pub fn format_str(text: &str, config: &FormatConfig) -> Result<String> {
    config.validate()?;
    let block = parser::parse(text)?;
    verifier::verify_structure(&block).into_result()?;

    let lines = normalize(&block, config);
    tracing::debug!(
        statements = block.len(),
        lines = lines.len(),
        "normalized outline"
    );
    Ok(join_lines(&lines))
}

/// Format a whole file's contents
///
/// Returns `Ok(None)` when there is nothing to change: the input is blank
/// or already in normalized form. Unless `config.fast` is set, the result
/// is checked for stability and equivalence before it is returned.
pub fn format_file_contents(text: &str, config: &FormatConfig) -> Result<Option<String>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let formatted = format_str(text, config)?;
    if formatted == text {
        return Ok(None);
    }
    if !config.fast {
        verifier::check_stability_and_equivalence(text, &formatted, config)?;
    }
    Ok(Some(formatted))
}

/// SHA-256 of the formatted text, lowercase hex
///
/// Two inputs that differ only in blank lines or stub layout share a
/// fingerprint.
pub fn fingerprint(text: &str, config: &FormatConfig) -> Result<String> {
    let formatted = format_str(text, config)?;
    let mut hasher = Sha256::new();
    hasher.update(formatted.as_bytes());
    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

// ── Walker ─────────────────────────────────────────────────

fn walk_block(block: &Block, depth: usize, config: &FormatConfig, out: &mut Vec<String>) {
    let mut prev: Option<ItemProfile> = None;

    for node in block {
        let item = render_statement(node, depth, config);
        let profile = item.profile();
        let boundary = spacing::boundary_before(prev.as_ref(), &profile, node.blank_before);
        let blanks = spacing::blank_lines(&boundary, config);
        tracing::trace!(
            depth,
            line = node.span.line,
            ?boundary,
            blanks,
            "boundary decided"
        );

        push_blanks(out, blanks);
        out.extend(item.lines);
        prev = Some(profile);
    }
}

/// Render one statement at `depth`, descending into its bodies unless it
/// collapses
pub fn render_statement(node: &StatementNode, depth: usize, config: &FormatConfig) -> RenderedItem {
    let marker = config.placeholder.as_str();
    let indent = config.indent(depth);
    let mut lines = Vec::new();

    push_comments(&mut lines, &indent, &node.leading_comments, config);
    for decorator in &node.decorators {
        push_text(&mut lines, &indent, decorator);
    }

    if matches!(node.category, Category::Verbatim | Category::Comment) {
        if node.category == Category::Comment {
            let comments: Vec<String> = node.header.split('\n').map(str::to_string).collect();
            push_comments(&mut lines, &indent, &comments, config);
        } else {
            push_text(&mut lines, &indent, &node.header);
        }
        return RenderedItem {
            lines,
            kind: node.kind,
            is_stub: false,
            merge_kind: None,
            supported: true,
        };
    }

    let is_stub = matches!(node.kind, Kind::FunctionLike | Kind::TypeLike)
        && stub::is_stub(node, marker);
    let merge_kind = merge::merge_kind(node, marker);

    if collapse::is_collapsible(node, config) {
        push_text(&mut lines, &indent, &collapse::collapse(&node.header, marker));
    } else {
        push_header(&mut lines, &indent, &node.header, node.trailing_comment.as_deref());
        walk_block(&node.body, depth + 1, config, &mut lines);
        for clause in &node.clauses {
            render_clause(clause, merge_kind, depth, config, &mut lines);
        }
    }

    RenderedItem {
        lines,
        kind: node.kind,
        is_stub,
        merge_kind,
        supported: classify::is_supported(node.category),
    }
}

fn render_clause(
    clause: &PairedClause,
    compound: Option<MergeKind>,
    depth: usize,
    config: &FormatConfig,
    out: &mut Vec<String>,
) {
    let indent = config.indent(depth);
    let boundary = Boundary::PairedClause { compound };
    let blanks = spacing::blank_lines(&boundary, config);
    tracing::trace!(depth, line = clause.span.line, ?boundary, blanks, "boundary decided");

    push_blanks(out, blanks);
    push_comments(out, &indent, &clause.leading_comments, config);
    push_header(out, &indent, &clause.header, clause.trailing_comment.as_deref());
    walk_block(&clause.body, depth + 1, config, out);
}

// ── Line helpers ───────────────────────────────────────────

fn push_blanks(out: &mut Vec<String>, count: usize) {
    out.extend(std::iter::repeat(String::new()).take(count));
}

/// Indent every physical line of `text`. Empty lines stay empty and lines
/// inside a string literal are copied as they are.
fn push_text(out: &mut Vec<String>, indent: &str, text: &str) {
    let literal = literal_rows(text);
    for (row, line) in text.split('\n').enumerate() {
        if line.is_empty() || literal.binary_search(&row).is_ok() {
            out.push(line.to_string());
        } else {
            out.push(format!("{}{}", indent, line));
        }
    }
}

/// Comment lines; an empty entry separates two comment groups
fn push_comments(out: &mut Vec<String>, indent: &str, comments: &[String], config: &FormatConfig) {
    for comment in comments {
        if comment.is_empty() {
            push_blanks(out, config.max_blank_lines);
        } else {
            out.push(format!("{}{}", indent, comment));
        }
    }
}

fn push_header(out: &mut Vec<String>, indent: &str, header: &str, comment: Option<&str>) {
    push_text(out, indent, header);
    if let (Some(comment), Some(last)) = (comment, out.last_mut()) {
        last.push_str("  ");
        last.push_str(comment);
    }
}

fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn fmt(input: &str) -> String {
        format_str(input, &FormatConfig::default()).unwrap()
    }

    fn fmt_with(input: &str, config: &FormatConfig) -> String {
        format_str(input, config).unwrap()
    }

    fn stub(category: Category, header: &str) -> StatementNode {
        StatementNode::new(category, header).with_body(vec![StatementNode::simple("...")])
    }

    // ── Scenarios ──────────────────────────────────────

    #[test]
    fn test_adjacent_type_stubs_collapse_and_merge() {
        let input = "class D:\n    ...\n\n\nclass C:\n    ...\n";
        assert_eq!(fmt(input), "class D: ...\nclass C: ...\n");
    }

    #[test]
    fn test_data_before_stub_keeps_separation() {
        let input = "class A:\n    attr: int\n\n    def f(): ...\n";
        assert_eq!(fmt(input), input);
        let tight = "class A:\n    attr: int\n    def f(): ...\n";
        assert_eq!(fmt(tight), input);
    }

    #[test]
    fn test_function_stubs_collapse_and_merge() {
        let input = "def g():\n    ...\n\ndef h(): ...\n";
        assert_eq!(fmt(input), "def g(): ...\ndef h(): ...\n");
    }

    #[test]
    fn test_no_blank_after_header() {
        let input = "class F:\n\n    def f(): ...\n";
        assert_eq!(fmt(input), "class F:\n    def f(): ...\n");
    }

    // ── Tree-level walker ──────────────────────────────

    #[test]
    fn test_normalize_tree_directly() {
        let tree = vec![
            stub(Category::Class, "class D:").with_blank_before(3),
            stub(Category::Class, "class C:").with_blank_before(2),
            StatementNode::simple("x: int"),
        ];
        let lines = normalize(&tree, &FormatConfig::default());
        assert_eq!(lines, vec!["class D: ...", "class C: ...", "", "x: int"]);
    }

    #[test]
    fn test_empty_tree() {
        assert!(normalize(&Vec::new(), &FormatConfig::default()).is_empty());
        assert_eq!(fmt(""), "");
        assert_eq!(fmt("\n\n  \n"), "");
    }

    #[test]
    fn test_rendered_item_profile() {
        let item = render_statement(&stub(Category::Def, "def f():"), 0, &FormatConfig::default());
        assert_eq!(item.lines, vec!["def f(): ..."]);
        assert!(item.is_stub);
        assert_eq!(item.merge_kind, Some(MergeKind::FunctionLike));
    }

    // ── Sibling boundaries ─────────────────────────────

    #[test]
    fn test_different_kind_stubs_separated() {
        let input = "def f(): ...\nclass A: ...\n";
        assert_eq!(fmt(input), "def f(): ...\n\nclass A: ...\n");
    }

    #[test]
    fn test_substantive_class_separated() {
        let input = "class A:\n    x: int\nclass B: ...\n";
        assert_eq!(fmt(input), "class A:\n    x: int\n\nclass B: ...\n");
    }

    #[test]
    fn test_blank_runs_clamped_to_one() {
        let input = "x: int\n\n\n\ndef f(): ...\n";
        assert_eq!(fmt(input), "x: int\n\ndef f(): ...\n");
    }

    #[test]
    fn test_data_siblings_separated() {
        assert_eq!(fmt("x: int\ny: str\n"), "x: int\n\ny: str\n");
    }

    // ── Compound boundaries ────────────────────────────

    #[test]
    fn test_uniform_gate_merges_with_matching_stub() {
        let input = "def a(): ...\n\nif sys.version_info >= (3, 8):\n    def f(): ...\n\nelse:\n    def f(x): ...\ndef b(): ...\n";
        let expected = "def a(): ...\nif sys.version_info >= (3, 8):\n    def f(): ...\nelse:\n    def f(x): ...\n\ndef b(): ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_mixed_gate_keeps_clauses_apart() {
        let input = "class A: ...\n\nif X:\n    def f(): ...\nelse:\n    class f: ...\n";
        let expected = "class A: ...\n\nif X:\n    def f(): ...\n\nelse:\n    class f: ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_entry_preserves_source_presence() {
        assert_eq!(fmt("x: int\nif X:\n    y: int\n"), "x: int\nif X:\n    y: int\n");
        assert_eq!(
            fmt("x: int\n\n\nif X:\n    y: int\n"),
            "x: int\n\nif X:\n    y: int\n"
        );
    }

    #[test]
    fn test_entry_with_kind_mismatch_preserves_source() {
        let input = "class A: ...\nif X:\n    def f(): ...\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_suite_exit_always_separates() {
        let input = "if X:\n    def f(): ...\ndef f(): ...\n";
        assert_eq!(fmt(input), "if X:\n    def f(): ...\n\ndef f(): ...\n");
    }

    #[test]
    fn test_nothing_after_last_compound() {
        let input = "class A:\n    if X:\n        x: int\n\ny: int\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_nested_gate_resolves_recursively() {
        let input = "def a(): ...\nif X:\n    if Y:\n        def f(): ...\n    else:\n        def f(): ...\nelse:\n    def f(): ...\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_unsupported_construct_kept_apart() {
        let input = "def a(): ...\nmatch x:\n    def f(): ...\ndef b(): ...\n";
        let expected = "def a(): ...\n\nmatch x:\n    def f(): ...\n\ndef b(): ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_unsupported_construct_first_in_suite() {
        let input = "class A:\n    match x:\n        y: int\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_try_except_chain() {
        let input = "try:\n    from a import b\nexcept ImportError:\n    b = None\n";
        let expected = "try:\n    from a import b\n\nexcept ImportError:\n    b = None\n";
        assert_eq!(fmt(input), expected);
    }

    // ── Collapse eligibility ───────────────────────────

    #[test]
    fn test_decorated_stub_not_collapsed_but_merged() {
        let input = "@overload\ndef f(): ...\n@overload\ndef f(x): ...\n";
        let expected = "@overload\ndef f():\n    ...\n@overload\ndef f(x):\n    ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_header_comment_blocks_collapse() {
        let input = "def f():  # noqa\n    ...\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_commented_placeholder_not_a_stub() {
        let input = "def f(): ...  # todo\ndef g(): ...\n";
        let expected = "def f():\n    ...  # todo\n\ndef g(): ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_multiline_header_not_collapsed() {
        let input = "def f(\n    a: int,\n) -> None: ...\n";
        let expected = "def f(\n    a: int,\n) -> None:\n    ...\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_multiline_header_reindented() {
        let input = "class A:\n  def f(\n      self,\n  ) -> None:\n      x = 1\n";
        let expected = "class A:\n    def f(\n        self,\n    ) -> None:\n        x = 1\n";
        assert_eq!(fmt(input), expected);
    }

    // ── Comments & verbatim ────────────────────────────

    #[test]
    fn test_leading_comments_follow_their_statement() {
        let input = "class A:\n    # first\n    def f(self): ...\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_comment_between_stubs_keeps_merge() {
        let input = "def f(): ...\n# about g\ndef g(): ...\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_verbatim_region_untouched() {
        let input = "# fmt: off\nx  =  1\n\n\ny=2\n# fmt: on\n";
        assert_eq!(fmt(input), input);
    }

    #[test]
    fn test_comment_groups_keep_one_blank_line() {
        assert_eq!(fmt("# hello\n\n\n# world\n"), "# hello\n\n# world\n");
        let input = "x: int\n# a\n\n\n# b\ny: int\n";
        assert_eq!(fmt(input), "x: int\n\n# a\n\n# b\ny: int\n");
    }

    #[test]
    fn test_comment_groups_joined_with_zero_cap() {
        let config = FormatConfig {
            max_blank_lines: 0,
            ..FormatConfig::default()
        };
        assert_eq!(fmt_with("# hello\n\n# world\n", &config), "# hello\n# world\n");
    }

    #[test]
    fn test_fmt_skip_line_left_as_written() {
        let input = "def f(): ...  # fmt: skip\ndef g(): ...\n";
        assert_eq!(fmt(input), "def f(): ...  # fmt: skip\n\ndef g(): ...\n");
        let nested = "class A:\n  x  =  [1,2]  # fmt:skip\n";
        assert_eq!(fmt(nested), "class A:\n    x  =  [1,2]  # fmt:skip\n");
    }

    #[test]
    fn test_string_literal_content_survives() {
        let input = "X = \"\"\"a   \nb\"\"\"\nclass A:\n  Y = \"\"\"\n  kept\n  \"\"\"\n";
        let expected = "X = \"\"\"a   \nb\"\"\"\n\nclass A:\n    Y = \"\"\"\n  kept\n  \"\"\"\n";
        let result = format_file_contents(input, &FormatConfig::default()).unwrap();
        assert_eq!(result.as_deref(), Some(expected));
        assert_eq!(fmt(expected), expected);
    }

    #[test]
    fn test_docstring_in_deeper_block_not_reindented() {
        let input = "class A:\n  def f(self):\n    \"\"\"Doc.\n\n    More.  \n    \"\"\"\n";
        let expected = "class A:\n    def f(self):\n        \"\"\"Doc.\n\n    More.  \n    \"\"\"\n";
        assert_eq!(fmt(input), expected);
    }

    /// Regression cases for `# fmt: off` inside brackets and around clauses
    const FMT_OFF_CASES: &str = r#"# Regression test for https://github.com/psf/black/issues/3129.
setup(
    entry_points={
        # fmt: off
        "console_scripts": [
            "foo-bar"
            "=foo.bar.:main",
        # fmt: on
        ]
    },
)


# Regression test for https://github.com/psf/black/issues/3129.
run(
    # fmt: off
    [
        "ls",
        "-la",
    ]
    # fmt: on
    + path
    ,
    check=True,
)


# Regression test for https://github.com/psf/black/issues/3026.
def test_func():
    # yapf: disable
    if a:
        return True
    # yapf: enable
    elif b:
        return True

    return False
"#;

    #[test]
    fn test_fmt_off_cases() {
        let expected = FMT_OFF_CASES.replace("\n\n\n", "\n\n");
        let result = format_file_contents(FMT_OFF_CASES, &FormatConfig::default()).unwrap();
        assert_eq!(result.as_deref(), Some(expected.as_str()));
        assert_eq!(fmt(&expected), expected);
    }

    #[test]
    fn test_verbatim_region_reindented_with_block() {
        let input = "class A:\n  # fmt: off\n  x  =  1\n  # fmt: on\n  y: int\n";
        let expected = "class A:\n    # fmt: off\n    x  =  1\n    # fmt: on\n\n    y: int\n";
        assert_eq!(fmt(input), expected);
    }

    // ── Configuration ──────────────────────────────────

    #[test]
    fn test_indent_width() {
        let config = FormatConfig {
            indent_width: 2,
            ..FormatConfig::default()
        };
        let input = "class A:\n    x: int\n    def f(self): ...\n";
        assert_eq!(fmt_with(input, &config), "class A:\n  x: int\n\n  def f(self): ...\n");
    }

    #[test]
    fn test_zero_blank_lines() {
        let config = FormatConfig {
            max_blank_lines: 0,
            ..FormatConfig::default()
        };
        let input = "x: int\n\nclass A:\n    y: int\n\nif X:\n    z: int\n";
        assert_eq!(fmt_with(input, &config), "x: int\nclass A:\n    y: int\nif X:\n    z: int\n");
    }

    #[test]
    fn test_collapse_disabled() {
        let config = FormatConfig {
            collapse_stubs: false,
            ..FormatConfig::default()
        };
        let input = "def f(): ...\ndef g(): ...\n";
        assert_eq!(fmt_with(input, &config), "def f():\n    ...\ndef g():\n    ...\n");
    }

    #[test]
    fn test_custom_placeholder() {
        let config = FormatConfig {
            placeholder: "pass".to_string(),
            ..FormatConfig::default()
        };
        let input = "def f():\n    pass\n\ndef g():\n    pass\n";
        assert_eq!(fmt_with(input, &config), "def f(): pass\ndef g(): pass\n");
        assert_eq!(fmt("def f(): pass\ndef g(): pass\n"), "def f():\n    pass\n\ndef g():\n    pass\n");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FormatConfig {
            max_blank_lines: 2,
            ..FormatConfig::default()
        };
        let err = format_str("x: int\n", &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    // ── Text entry points ──────────────────────────────

    #[test]
    fn test_format_file_contents_nothing_changed() {
        let config = FormatConfig::default();
        assert_eq!(format_file_contents("", &config).unwrap(), None);
        assert_eq!(format_file_contents("def f(): ...\n", &config).unwrap(), None);
    }

    #[test]
    fn test_format_file_contents_changed() {
        let config = FormatConfig::default();
        let result = format_file_contents("def f():\n    ...\n", &config).unwrap();
        assert_eq!(result.as_deref(), Some("def f(): ...\n"));
    }

    #[test]
    fn test_format_file_contents_fast_mode() {
        let config = FormatConfig {
            fast: true,
            ..FormatConfig::default()
        };
        let result = format_file_contents("class A:\n\n    x: int\n", &config).unwrap();
        assert_eq!(result.as_deref(), Some("class A:\n    x: int\n"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = format_str("class A:\nx: int\n", &FormatConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(fmt("def f():\r\n    ...\r\n"), "def f(): ...\n");
    }

    // ── Fingerprint ────────────────────────────────────

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let hash = fingerprint("def f(): ...\n", &FormatConfig::default()).unwrap();
        assert_eq!(hash.len(), 64, "Hash should be 64 hex chars, got: {}", hash);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_ignores_spacing() {
        let config = FormatConfig::default();
        let a = fingerprint("class D:\n    ...\n\n\nclass C:\n    ...\n", &config).unwrap();
        let b = fingerprint("class D: ...\nclass C: ...\n", &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_content_different_fingerprint() {
        let config = FormatConfig::default();
        let a = fingerprint("def f(): ...\n", &config).unwrap();
        let b = fingerprint("def g(): ...\n", &config).unwrap();
        assert_ne!(a, b, "Different stubs should have different fingerprints");
    }

    // ── Idempotence & determinism ──────────────────────

    const SAMPLE: &str = r#"import sys
from typing import overload

_T = TypeVar("_T")
class Empty:
    ...


class Box(Generic[_T]):

    # the wrapped value
    value: _T
    def __init__(self, value: _T) -> None: ...
    def get(self) -> _T:
        ...
    @overload
    def pick(self, i: int) -> _T: ...
    @overload
    def pick(self, i: slice) -> list[_T]: ...
    if sys.version_info >= (3, 9):
        def __class_getitem__(cls, item): ...
    else:
        def __class_getitem__(cls, item, extra): ...
    class Inner: ...
    class Other: ...
if sys.platform == "win32":
    def winonly() -> None: ...

else:
    class winonly: ...
def tail(
    a: int,
    b: str = "x",
) -> None: ...
"#;

    #[test]
    fn test_idempotence() {
        let once = fmt(SAMPLE);
        let twice = fmt(&once);
        assert_eq!(once, twice, "format(format(x)) must equal format(x)");
    }

    #[test]
    fn test_sample_passes_safety_check() {
        let result = format_file_contents(SAMPLE, &FormatConfig::default());
        assert!(result.is_ok(), "safety check failed: {:?}", result.err());
    }

    #[test]
    fn test_format_determinism_100_iterations() {
        let first = fmt(SAMPLE);
        for i in 0..100 {
            assert_eq!(fmt(SAMPLE), first, "Determinism failure at iteration {}", i);
        }
    }

    #[test]
    fn test_output_never_has_two_blank_lines() {
        let out = fmt(SAMPLE);
        assert!(!out.contains("\n\n\n"), "double blank line in:\n{}", out);
    }

    #[test]
    fn test_order_preserved() {
        let out = fmt(SAMPLE);
        let names = ["Empty", "Box", "__init__", "get", "pick", "Inner", "Other", "winonly", "tail"];
        let positions: Vec<usize> = names.iter().map(|n| out.find(n).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "order changed:\n{}", out);
    }
}
