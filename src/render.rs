//! Markdown subset renderer: turn a backend answer into display markup.
//!
//! The RAG backend answers in loose Markdown. Rather than a full CommonMark
//! parser, this module applies a fixed list of regex substitutions that cover
//! the handful of constructs the model actually emits: three heading levels,
//! bold, italic, bullet items, inline code and line breaks.
//!
//! ## Rule Order
//!
//! Each rule runs over the output of the previous one, so order is part of the
//! behaviour:
//!
//! - headings run first, so emphasis markers inside a heading are substituted
//!   afterwards, inside the heading element;
//! - bold (`**`, `__`) runs before italic (`*`, `_`) so the doubled markers are
//!   consumed before the single-character rules can see them;
//! - italic runs before bullet items, so a line like `* a * b` becomes
//!   emphasis and never a list item;
//! - newlines are converted last because the heading and list rules match on
//!   them.
//!
//! This is not a structural parse. A lone `*`, `_` or backtick stays as text,
//! a lone `**` is paired by the italic rule into an empty `<em>`, list items
//! are not wrapped in `<ul>`, and heading markers match anywhere in a line.
//!
//! ## Escaping
//!
//! With [`RenderOptions::escape_html`] (the default) the five HTML-significant
//! characters are replaced by entities before any rule runs, so the answer
//! can never inject markup of its own. None of the entity texts contain a
//! marker sequence, so escaping does not change which rules match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Options for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Escape `& < > " '` before substitution. Default: true.
    ///
    /// Turning this off passes raw markup in the answer straight through to
    /// the output. Only do that when the backend is trusted.
    pub escape_html: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { escape_html: true }
    }
}

/// Render an answer with the default [`RenderOptions`].
pub fn render_markdown(input: &str) -> String {
    render(Some(input), RenderOptions::default())
}

/// Render an optional answer into markup.
///
/// Absent or empty input yields an empty string; any placeholder text is the
/// caller's concern. Never fails: unbalanced markers are left as text.
///
/// Rules (applied in order):
/// 1. `### text` → `<h3>`
/// 2. `## text` → `<h2>`
/// 3. `# text` → `<h1>`
/// 4. `**text**` → `<strong>`
/// 5. `__text__` → `<strong>`
/// 6. `*text*` → `<em>`
/// 7. `_text_` → `<em>`
/// 8. `* item` at line start → `<li>`
/// 9. `- item` at line start → `<li>`
/// 10. `` `code` `` → `<code>`
/// 11. blank line → `<br/><br/>`
/// 12. newline → `<br/>`
pub fn render(input: Option<&str>, options: RenderOptions) -> String {
    let text = match input {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let s = if options.escape_html {
        escape_html(text)
    } else {
        text.to_string()
    };
    let s = render_headings(&s);
    let s = render_bold(&s);
    let s = render_italic(&s);
    let s = render_list_items(&s);
    let s = render_inline_code(&s);
    render_line_breaks(&s)
}

// ── Escaping ─────────────────────────────────────────────────────────────────

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ── Line terminators ─────────────────────────────────────────────────────────
//
// Captures stop at `\n`, `\r`, U+2028 and U+2029, not only at `\n`. An answer
// with CRLF line endings therefore keeps its `\r` outside every element, and a
// marker whose text runs into a bare `\r` or a separator is left as text.

/// One character that does not end a line.
const LINE_CHAR: &str = r"[^\n\r\x{2028}\x{2029}]";

/// Start of input or the line terminator just before a line start (captured).
const LINE_START: &str = r"(^|[\n\r\x{2028}\x{2029}])";

fn line_regex(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("{LINE}", LINE_CHAR).replace("{START}", LINE_START)).unwrap()
}

// ── Rules 1-3: Headings ──────────────────────────────────────────────────────
//
// The trailing newline is part of the match and is dropped: the heading
// element already breaks the line. A heading only matches when its text ends
// at a `\n` or at the end of input.

static RE_H3: Lazy<Regex> = Lazy::new(|| line_regex(r"### ({LINE}*?)(\n|$)"));
static RE_H2: Lazy<Regex> = Lazy::new(|| line_regex(r"## ({LINE}*?)(\n|$)"));
static RE_H1: Lazy<Regex> = Lazy::new(|| line_regex(r"# ({LINE}*?)(\n|$)"));

fn render_headings(input: &str) -> String {
    let s = RE_H3.replace_all(input, r#"<h3 class="answer-h3">${1}</h3>"#);
    let s = RE_H2.replace_all(&s, r#"<h2 class="answer-h2">${1}</h2>"#);
    RE_H1
        .replace_all(&s, r#"<h1 class="answer-h1">${1}</h1>"#)
        .to_string()
}

// ── Rules 4-5: Bold ──────────────────────────────────────────────────────────

static RE_BOLD_STARS: Lazy<Regex> = Lazy::new(|| line_regex(r"\*\*({LINE}*?)\*\*"));
static RE_BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| line_regex(r"__({LINE}*?)__"));

fn render_bold(input: &str) -> String {
    let s = RE_BOLD_STARS.replace_all(input, r#"<strong class="answer-strong">${1}</strong>"#);
    RE_BOLD_UNDERSCORES
        .replace_all(&s, r#"<strong class="answer-strong">${1}</strong>"#)
        .to_string()
}

// ── Rules 6-7: Italic ────────────────────────────────────────────────────────
//
// Also matches inside identifiers: `snake_case_name` renders `case` as
// emphasis. Bold has already consumed every balanced `**`/`__` pair.

static RE_ITALIC_STAR: Lazy<Regex> = Lazy::new(|| line_regex(r"\*({LINE}*?)\*"));
static RE_ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| line_regex(r"_({LINE}*?)_"));

fn render_italic(input: &str) -> String {
    let s = RE_ITALIC_STAR.replace_all(input, r#"<em class="answer-em">${1}</em>"#);
    RE_ITALIC_UNDERSCORE
        .replace_all(&s, r#"<em class="answer-em">${1}</em>"#)
        .to_string()
}

// ── Rules 8-9: Bullet items ──────────────────────────────────────────────────
//
// A line starts after any terminator, so `\r` alone also opens a new line. The
// item text runs to the next terminator; the terminator itself is never
// consumed, so back-to-back items each see their own line start.

static RE_ITEM_STAR: Lazy<Regex> = Lazy::new(|| line_regex(r"{START}\* ({LINE}*)"));
static RE_ITEM_DASH: Lazy<Regex> = Lazy::new(|| line_regex(r"{START}- ({LINE}*)"));

fn render_list_items(input: &str) -> String {
    let s = RE_ITEM_STAR.replace_all(input, r#"${1}<li class="answer-li">${2}</li>"#);
    RE_ITEM_DASH
        .replace_all(&s, r#"${1}<li class="answer-li">${2}</li>"#)
        .to_string()
}

// ── Rule 10: Inline code ─────────────────────────────────────────────────────

static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

fn render_inline_code(input: &str) -> String {
    RE_CODE
        .replace_all(input, r#"<code class="answer-code">${1}</code>"#)
        .to_string()
}

// ── Rules 11-12: Line breaks ─────────────────────────────────────────────────

fn render_line_breaks(input: &str) -> String {
    input.replace("\n\n", "<br/><br/>").replace('\n', "<br/>")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: RenderOptions = RenderOptions { escape_html: false };

    #[test]
    fn test_empty_and_absent_input() {
        assert_eq!(render(None, RenderOptions::default()), "");
        assert_eq!(render(Some(""), RenderOptions::default()), "");
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_h1() {
        assert_eq!(
            render_markdown("# Title"),
            r#"<h1 class="answer-h1">Title</h1>"#
        );
    }

    #[test]
    fn test_h2_and_h3_are_not_demoted() {
        assert_eq!(
            render_markdown("## Section"),
            r#"<h2 class="answer-h2">Section</h2>"#
        );
        assert_eq!(
            render_markdown("### Detail"),
            r#"<h3 class="answer-h3">Detail</h3>"#
        );
    }

    #[test]
    fn test_heading_takes_first_line_and_consumes_newline() {
        assert_eq!(
            render_markdown("## Summary\nbody text"),
            r#"<h2 class="answer-h2">Summary</h2>body text"#
        );
    }

    #[test]
    fn test_heading_marker_matches_mid_line() {
        assert_eq!(
            render_markdown("see # note"),
            r#"see <h1 class="answer-h1">note</h1>"#
        );
    }

    #[test]
    fn test_heading_capture_keeps_whitespace() {
        assert_eq!(
            render_markdown("#   spaced  "),
            r#"<h1 class="answer-h1">  spaced  </h1>"#
        );
    }

    #[test]
    fn test_bold() {
        let out = render_markdown("**bold**");
        assert_eq!(out, r#"<strong class="answer-strong">bold</strong>"#);
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_bold_underscores() {
        assert_eq!(
            render_markdown("__bold__"),
            r#"<strong class="answer-strong">bold</strong>"#
        );
    }

    #[test]
    fn test_bold_before_italic() {
        assert_eq!(
            render_markdown("*a* and **b**"),
            r#"<em class="answer-em">a</em> and <strong class="answer-strong">b</strong>"#
        );
    }

    #[test]
    fn test_emphasis_inside_heading() {
        assert_eq!(
            render_markdown("# **Key** point"),
            r#"<h1 class="answer-h1"><strong class="answer-strong">Key</strong> point</h1>"#
        );
    }

    #[test]
    fn test_underscore_inside_identifier_becomes_emphasis() {
        assert_eq!(
            render_markdown("snake_case_name"),
            r#"snake<em class="answer-em">case</em>name"#
        );
    }

    #[test]
    fn test_list_items_are_not_wrapped() {
        assert_eq!(
            render_markdown("* one\n* two"),
            r#"<li class="answer-li">one</li><br/><li class="answer-li">two</li>"#
        );
        assert_eq!(
            render_markdown("- alpha\n- beta"),
            r#"<li class="answer-li">alpha</li><br/><li class="answer-li">beta</li>"#
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            render_markdown("run `cargo doc` now"),
            r#"run <code class="answer-code">cargo doc</code> now"#
        );
    }

    #[test]
    fn test_empty_backticks_left_verbatim() {
        assert_eq!(render_markdown("a `` b"), "a `` b");
    }

    #[test]
    fn test_paragraph_break() {
        let out = render_markdown("line1\n\nline2");
        assert_eq!(out, "line1<br/><br/>line2");
        assert_eq!(out.matches("<br/>").count(), 2);
    }

    #[test]
    fn test_single_newline() {
        assert_eq!(render_markdown("a\nb"), "a<br/>b");
    }

    #[test]
    fn test_three_newlines() {
        assert_eq!(render_markdown("a\n\n\nb"), "a<br/><br/><br/>b");
    }

    #[test]
    fn test_unmatched_star_left_verbatim() {
        assert_eq!(render_markdown("a * b"), "a * b");
    }

    #[test]
    fn test_lone_double_star_is_empty_emphasis() {
        // The bold rule needs a closing pair; the italic rule then pairs the two stars.
        assert_eq!(
            render_markdown("a ** b"),
            r#"a <em class="answer-em"></em> b"#
        );
    }

    #[test]
    fn test_unmatched_backtick_left_verbatim() {
        assert_eq!(render_markdown("a ` b"), "a ` b");
    }

    #[test]
    fn test_escape_neutralises_markup() {
        let out = render_markdown("<script>alert('x')</script> & more");
        assert!(!out.contains("<script>"));
        assert_eq!(
            out,
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"
        );
    }

    #[test]
    fn test_escape_does_not_change_rule_matching() {
        assert_eq!(
            render_markdown("# \"Quoted\" <b>"),
            r#"<h1 class="answer-h1">&quot;Quoted&quot; &lt;b&gt;</h1>"#
        );
    }

    #[test]
    fn test_raw_mode_passes_markup_through() {
        assert_eq!(
            render(Some("<b>hi</b> **x**"), RAW),
            r#"<b>hi</b> <strong class="answer-strong">x</strong>"#
        );
    }

    #[test]
    fn test_class_names_survive_later_rules() {
        // Every generated tag must be stable under the rules that run after it.
        let out = render_markdown("# h\n**b** *i* `c`\n- item");
        assert_eq!(
            out,
            concat!(
                r#"<h1 class="answer-h1">h</h1>"#,
                r#"<strong class="answer-strong">b</strong> "#,
                r#"<em class="answer-em">i</em> "#,
                r#"<code class="answer-code">c</code><br/>"#,
                r#"<li class="answer-li">item</li>"#,
            )
        );
    }

    #[test]
    fn test_crlf_heading_is_left_as_text() {
        // The heading text runs into `\r`, which is not a `\n` or the end.
        assert_eq!(render(Some("# a\r\nb"), RAW), "# a\r<br/>b");
        assert_eq!(
            render(Some("## a\nb\r\n"), RAW),
            "<h2 class=\"answer-h2\">a</h2>b\r<br/>"
        );
    }

    #[test]
    fn test_emphasis_does_not_span_line_terminators() {
        assert_eq!(render(Some("*a\rb*"), RAW), "*a\rb*");
        // Bold cannot close across U+2029, so each `**` pair becomes an empty `<em>`.
        assert_eq!(
            render(Some("**a\u{2029}b**"), RAW),
            "<em class=\"answer-em\"></em>a\u{2029}b<em class=\"answer-em\"></em>"
        );
        assert_eq!(render(Some("_a\u{2028}b_"), RAW), "_a\u{2028}b_");
    }

    #[test]
    fn test_line_separator_ends_heading_text() {
        assert_eq!(render(Some("# \u{2028}x"), RAW), "# \u{2028}x");
    }

    #[test]
    fn test_crlf_list_items() {
        assert_eq!(
            render(Some("* one\r\n- two"), RAW),
            "<li class=\"answer-li\">one</li>\r<br/><li class=\"answer-li\">two</li>"
        );
        // A bare `\r` starts a new line for the item rules.
        assert_eq!(
            render(Some("intro\r- item"), RAW),
            "intro\r<li class=\"answer-li\">item</li>"
        );
    }

    #[test]
    fn test_deterministic() {
        let input = "## A\n* b\n\n`c` _d_";
        assert_eq!(render_markdown(input), render_markdown(input));
    }
}
