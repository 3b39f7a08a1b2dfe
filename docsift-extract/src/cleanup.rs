//! Post-processing of extracted HTML text.
//!
//! Text pulled out of a document can still carry markup: `noscript` bodies
//! are raw text to the tokenizer, and escaped tags (`&lt;div&gt;`) decode
//! to literal ones. This pass strips the structural remnants, drops
//! comments and squeezes out blank lines.

use regex::Regex;
use std::sync::LazyLock;

/// Opening or closing tags of structural/embedded elements. Lower-case only:
/// the tokenizer lower-cases element names upstream.
static STRUCTURAL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:div|a|img|picture|svg|video|audio|track|source|canvas|map|noscript|iframe)[^>]*>")
        .expect("structural tag pattern")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

/// Replace structural tags and comments with line breaks, then trim every
/// line and drop the empty ones. Each kept line ends with `\n`.
pub fn clean_up(content: &str) -> String {
    let content = STRUCTURAL_TAG.replace_all(content, "\n");
    let content = COMMENT.replace_all(&content, "\n");

    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_structural_tags() {
        assert_eq!(clean_up(r#"<div class="x">hello</div>"#), "hello\n");
        assert_eq!(
            clean_up(r#"before<img src="a.png" alt="x"/>after"#),
            "before\nafter\n"
        );
        assert_eq!(
            clean_up("<noscript><iframe src=\"//t.example\"></iframe></noscript>Enable JS"),
            "Enable JS\n"
        );
    }

    #[test]
    fn leaves_other_markup_alone() {
        assert_eq!(clean_up("<p>kept</p>"), "<p>kept</p>\n");
        // Upper-case names are not matched.
        assert_eq!(clean_up("<DIV>x</DIV>"), "<DIV>x</DIV>\n");
    }

    #[test]
    fn removes_multiline_comments() {
        assert_eq!(clean_up("a<!-- one\ntwo -->b"), "a\nb\n");
        assert_eq!(clean_up("x<!--a-->y<!--b-->z"), "x\ny\nz\n");
    }

    #[test]
    fn trims_and_drops_blank_lines() {
        assert_eq!(clean_up("  one  \n\n\t\n two\r\n"), "one\ntwo\n");
        assert_eq!(clean_up(""), "");
        assert_eq!(clean_up(" \n \n"), "");
    }
}
