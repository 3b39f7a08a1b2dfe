//! Text and metadata extraction from HTML.
//!
//! The source is buffered once and read two ways:
//!
//! - a metadata walk over the parsed tree, reading `<title>` and
//!   `<meta name="description">`
//! - a text walk over the flat token stream (open, close, text) as the
//!   tokenizer produces it, emitting text only outside `style`, `script` and
//!   `footer`
//!
//! The text walk never sees tree-builder repairs: an unclosed `<footer>`
//! stays open until a literal `</footer>`, and `<footer/>` opens one too.
//! Each excluded element has one boolean rather than a depth counter, so the
//! first closing tag of a kind re-enables output even if an outer element of
//! the same kind is still open.

use std::cell::RefCell;

use docsift_common::{ExtractionResult, Metadata, Result, SiftError, DESCRIPTION_KEY, TITLE_KEY};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token as RawToken, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::TokenizerResult;
use scraper::Html;

use crate::cleanup::clean_up;

/// One lexical token of the source, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open { name: String, self_closing: bool },
    Close(String),
    Text(String),
}

/// Exclusion flags of the text walk. Output is emitted only while all
/// three are clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionState {
    pub inside_style: bool,
    pub inside_script: bool,
    pub inside_footer: bool,
}

impl ExclusionState {
    fn flag(&mut self, tag: &str) -> Option<&mut bool> {
        match tag {
            "style" => Some(&mut self.inside_style),
            "script" => Some(&mut self.inside_script),
            "footer" => Some(&mut self.inside_footer),
            _ => None,
        }
    }

    pub fn enter(&mut self, tag: &str) {
        if let Some(flag) = self.flag(tag) {
            *flag = true;
        }
    }

    pub fn exit(&mut self, tag: &str) {
        if let Some(flag) = self.flag(tag) {
            *flag = false;
        }
    }

    pub fn is_clear(&self) -> bool {
        !(self.inside_style || self.inside_script || self.inside_footer)
    }
}

/// Elements whose content is read as text up to the matching end tag.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "title" | "textarea" => Some(RawKind::Rcdata),
        "style" | "noscript" | "iframe" | "xmp" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        _ => None,
    }
}

/// Collects tokenizer output, merging adjacent character runs.
#[derive(Default)]
struct TokenCollector {
    tokens: RefCell<Vec<Token>>,
}

impl TokenCollector {
    fn push_text(&self, text: &str) {
        let mut tokens = self.tokens.borrow_mut();
        match tokens.last_mut() {
            Some(Token::Text(run)) => run.push_str(text),
            _ => tokens.push(Token::Text(text.to_string())),
        }
    }
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: RawToken, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            RawToken::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let raw = if tag.self_closing { None } else { raw_kind(&name) };
                        self.tokens.borrow_mut().push(Token::Open {
                            name,
                            self_closing: tag.self_closing,
                        });
                        if let Some(kind) = raw {
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => self.tokens.borrow_mut().push(Token::Close(name)),
                }
            }
            RawToken::CharacterTokens(text) => self.push_text(&text),
            RawToken::NullCharacterToken => self.push_text("\u{fffd}"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Split `source` into tokens the way a streaming HTML lexer does: no
/// implied tags, no re-nesting, lower-cased tag names, decoded entities.
///
/// ```
/// use docsift_extract::html::{tokenize, Token};
///
/// let tokens = tokenize("<p>a<br/>b</P>");
/// assert_eq!(tokens[0], Token::Open { name: "p".into(), self_closing: false });
/// assert_eq!(tokens.last(), Some(&Token::Close("p".into())));
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    let tokenizer = Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from(source));
    while let TokenizerResult::Script(()) = tokenizer.feed(&input) {}
    tokenizer.end();
    tokenizer.sink.tokens.take()
}

/// A buffered HTML document.
pub struct HtmlDocument {
    source: String,
    tree: Html,
}

impl HtmlDocument {
    /// Parse a UTF-8 HTML document. Malformed markup is recovered by the
    /// tokenizer and tree builder; only undecodable input fails.
    pub fn parse(source: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(source)
            .map_err(|e| SiftError::ParseFailure(format!("error parsing HTML: {e}")))?;
        Ok(Self::parse_str(text))
    }

    pub fn parse_str(source: &str) -> Self {
        Self {
            source: source.to_string(),
            tree: Html::parse_document(source),
        }
    }

    /// Tokens of the buffered source, in source order.
    pub fn tokens(&self) -> Vec<Token> {
        tokenize(&self.source)
    }

    /// Page title and description.
    ///
    /// The title is the trimmed text of every `<title>` element. For
    /// `<meta name="description">`, the last non-empty `content` in
    /// document order wins.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        let mut title = String::new();

        for node in self.tree.tree.root().descendants() {
            let Some(el) = node.value().as_element() else {
                continue;
            };
            match el.name() {
                "title" => {
                    for text in node.descendants().filter_map(|n| n.value().as_text()) {
                        title.push_str(text);
                    }
                }
                "meta" => {
                    let name = el.attr("name").unwrap_or_default().trim();
                    let content = el.attr("content").unwrap_or_default().trim();
                    if name == DESCRIPTION_KEY && !content.is_empty() {
                        metadata.insert(DESCRIPTION_KEY.to_string(), content.to_string());
                    }
                }
                _ => {}
            }
        }

        let title = title.trim();
        if !title.is_empty() {
            metadata.insert(TITLE_KEY.to_string(), title.to_string());
        }
        metadata
    }

    /// Raw text of the content-bearing regions, before cleanup.
    pub fn raw_text(&self) -> String {
        let mut state = ExclusionState::default();
        let mut buffer = String::new();
        for token in self.tokens() {
            match token {
                Token::Open { name, .. } => state.enter(&name),
                Token::Close(name) => state.exit(&name),
                Token::Text(text) if state.is_clear() => buffer.push_str(&text),
                Token::Text(_) => {}
            }
        }
        buffer
    }

    /// Cleaned text plus metadata.
    pub fn extract(&self) -> ExtractionResult {
        ExtractionResult::new(clean_up(&self.raw_text()), self.metadata())
    }
}

/// Parse `source` and extract its cleaned text and metadata.
pub fn extract_text_and_metadata(source: &[u8]) -> Result<ExtractionResult> {
    let doc = HtmlDocument::parse(source)?;
    let result = doc.extract();
    tracing::debug!(
        bytes = source.len(),
        text_len = result.text.len(),
        has_title = result.metadata.contains_key(TITLE_KEY),
        has_description = result.metadata.contains_key(DESCRIPTION_KEY),
        "html.extract"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>T</title><meta name="description" content="D"></head><body>visible<style>.x{color:red}</style><script>alert(1)</script><footer>bye</footer></body></html>"#;

    #[test]
    fn excludes_style_script_and_footer() {
        let result = extract_text_and_metadata(PAGE.as_bytes()).unwrap();
        assert_eq!(result.metadata.get("title").map(String::as_str), Some("T"));
        assert_eq!(result.metadata.get("description").map(String::as_str), Some("D"));
        assert!(result.text.contains("visible"));
        assert!(!result.text.contains("color:red"));
        assert!(!result.text.contains("alert(1)"));
        assert!(!result.text.contains("bye"));
    }

    #[test]
    fn title_text_is_part_of_the_body_text() {
        let result = extract_text_and_metadata(PAGE.as_bytes()).unwrap();
        assert_eq!(result.text, "Tvisible\n");
    }

    #[test]
    fn last_description_wins_in_document_order() {
        let html = r#"<html><head>
            <meta name="description" content="first">
            <meta name=" description " content="  second  ">
            <meta name="description" content="   ">
            <meta name="keywords" content="ignored">
        </head><body></body></html>"#;
        let metadata = HtmlDocument::parse_str(html).metadata();
        assert_eq!(metadata.get("description").map(String::as_str), Some("second"));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn missing_or_blank_fields_are_absent() {
        let metadata = HtmlDocument::parse_str("<html><head><title>  </title></head></html>").metadata();
        assert!(metadata.is_empty());
    }

    #[test]
    fn title_is_trimmed() {
        let metadata = HtmlDocument::parse_str("<title>\n  Hello &amp; welcome \n</title>").metadata();
        assert_eq!(metadata.get("title").map(String::as_str), Some("Hello & welcome"));
    }

    #[test]
    fn footer_containing_style_stays_excluded() {
        let html = "<body>a<footer>b<style>c</style>d</footer>e</body>";
        assert_eq!(HtmlDocument::parse_str(html).raw_text(), "ae");
    }

    #[test]
    fn nested_same_name_exclusion_is_not_counted() {
        // The inner </footer> clears the flag although the outer footer is
        // still open, so "tail" is emitted.
        let html = "<body>head<footer>x<footer>y</footer>tail</footer>end</body>";
        assert_eq!(HtmlDocument::parse_str(html).raw_text(), "headtailend");
    }

    #[test]
    fn noscript_markup_is_cleaned() {
        let html = r#"<body><p>Hi</p><noscript><img src="pixel.gif"></noscript></body>"#;
        let result = extract_text_and_metadata(html.as_bytes()).unwrap();
        assert_eq!(result.text, "Hi\n");
    }

    #[test]
    fn escaped_comment_text_is_cleaned() {
        let html = "<body><p>one</p><p>&lt;!-- hidden --&gt;two</p></body>";
        let result = extract_text_and_metadata(html.as_bytes()).unwrap();
        assert_eq!(result.text, "one\ntwo\n");
    }

    #[test]
    fn tokens_follow_document_order() {
        let open = |name: &str| Token::Open { name: name.into(), self_closing: false };
        assert_eq!(
            tokenize("<p>a<b>b</b></p>"),
            vec![
                open("p"),
                Token::Text("a".into()),
                open("b"),
                Token::Text("b".into()),
                Token::Close("b".into()),
                Token::Close("p".into()),
            ]
        );
    }

    #[test]
    fn script_body_is_one_text_token() {
        let tokens = tokenize("<script>if (a < b) { x = '</p>'; }</script>");
        assert_eq!(
            tokens,
            vec![
                Token::Open { name: "script".into(), self_closing: false },
                Token::Text("if (a < b) { x = '</p>'; }".into()),
                Token::Close("script".into()),
            ]
        );
    }

    #[test]
    fn unclosed_footer_excludes_rest_of_document() {
        let doc = HtmlDocument::parse_str(
            "<body><div>keep<footer>legal</div>after-unclosed-footer</body>",
        );
        assert_eq!(doc.raw_text(), "keep");
        assert_eq!(doc.extract().text, "keep\n");
    }

    #[test]
    fn self_closing_footer_opens_exclusion() {
        let doc = HtmlDocument::parse_str(
            "<body><div>keep<footer/>inside</div>after-self-closed-footer</body>",
        );
        assert_eq!(doc.raw_text(), "keep");
        assert_eq!(doc.extract().text, "keep\n");
    }

    #[test]
    fn footer_text_resumes_after_literal_close() {
        let doc = HtmlDocument::parse_str("<div>a<footer>b</div>c</footer>d</div>");
        assert_eq!(doc.raw_text(), "ad");
    }

    #[test]
    fn invalid_utf8_is_a_parse_failure() {
        let err = extract_text_and_metadata(&[0x3c, 0x70, 0x3e, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), docsift_common::ErrorKind::ParseFailure);
    }

    #[test]
    fn empty_document() {
        let result = extract_text_and_metadata(b"").unwrap();
        assert_eq!(result, ExtractionResult::default());
    }
}
