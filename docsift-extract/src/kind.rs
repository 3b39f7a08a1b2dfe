use std::fmt;
use std::path::Path;

/// Supported input extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileExtensionKind {
    Pdf,
    Doc,
    Docx,
    Odt,
    Rtf,
    Pages,
    Html,
    Txt,
    Md,
    Json,
}

impl FileExtensionKind {
    pub const ALL: [Self; 10] = [
        Self::Pdf,
        Self::Doc,
        Self::Docx,
        Self::Odt,
        Self::Rtf,
        Self::Pages,
        Self::Html,
        Self::Txt,
        Self::Md,
        Self::Json,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Odt => "odt",
            Self::Rtf => "rtf",
            Self::Pages => "pages",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Json => "json",
        }
    }

    /// Match an extension name, ignoring case and surrounding whitespace.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == ext)
    }

    /// Classify a path by the text after its last `.`.
    ///
    /// A path without any dot is classified by its whole text, which never
    /// names a known extension in practice.
    ///
    /// ```
    /// use docsift_extract::FileExtensionKind;
    ///
    /// assert_eq!(FileExtensionKind::from_path("/a/b/test.PDF"), Some(FileExtensionKind::Pdf));
    /// assert_eq!(FileExtensionKind::from_path("test"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref().to_string_lossy();
        let path: &str = &path;
        let ext = path.rsplit_once('.').map_or(path, |(_, ext)| ext);
        Self::from_extension(ext)
    }

    /// Formats handed to an external document parser.
    pub fn is_office(self) -> bool {
        matches!(
            self,
            Self::Pdf | Self::Doc | Self::Docx | Self::Odt | Self::Rtf | Self::Pages
        )
    }

    /// Formats read as-is and only normalised.
    pub fn is_plain_text(self) -> bool {
        matches!(self, Self::Txt | Self::Md | Self::Json)
    }
}

impl fmt::Display for FileExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_last_extension() {
        let cases = [
            ("/a/b/test.PDF", Some(FileExtensionKind::Pdf)),
            ("report.final.docx", Some(FileExtensionKind::Docx)),
            ("notes.md ", Some(FileExtensionKind::Md)),
            ("index.html", Some(FileExtensionKind::Html)),
            ("Keynote.pages", Some(FileExtensionKind::Pages)),
            ("data.JSON", Some(FileExtensionKind::Json)),
            ("test", None),
            ("archive.tar.gz", None),
            ("/a.b/README", None),
            ("", None),
        ];
        for (path, expected) in cases {
            assert_eq!(FileExtensionKind::from_path(path), expected, "{path}");
        }
    }

    #[test]
    fn families() {
        assert!(FileExtensionKind::Rtf.is_office());
        assert!(!FileExtensionKind::Html.is_office());
        assert!(FileExtensionKind::Json.is_plain_text());
        assert!(!FileExtensionKind::Pdf.is_plain_text());
        for kind in FileExtensionKind::ALL {
            assert_eq!(FileExtensionKind::from_extension(kind.as_str()), Some(kind));
        }
    }
}
