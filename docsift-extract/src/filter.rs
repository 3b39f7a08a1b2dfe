//! Normalisation of arbitrary text into printable text.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
///
/// Every other separator (tab, no-break space, line separators) and every
/// control, format, private-use or unassigned code point is rejected.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
    )
}

/// Keep printable characters and newlines, dropping everything else, and
/// collapse every run of newlines into one.
///
/// Dropped characters do not break a run, so `"\n\r\n"` becomes `"\n"`.
pub fn filter_non_readable(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = None;
    for c in input.chars() {
        if !(c == '\n' || is_printable(c)) {
            continue;
        }
        if c == '\n' && last == Some('\n') {
            continue;
        }
        out.push(c);
        last = Some(c);
    }
    out
}
