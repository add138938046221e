use std::fmt;

/// File name offered for the report download.
pub const REPORT_FILENAME: &str = "birdwatch_report.md";

/// Mime type the report download is served with.
pub const REPORT_MIME: &str = "text/markdown; charset=utf-8";

macro_rules! markdown_text {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn new(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

markdown_text!(
    /// Stage A output: species identification markdown, unvalidated.
    IdentificationResult
);

markdown_text!(
    /// Stage B output: markdown bullet list of research links, unvalidated.
    ResearchLinks
);

markdown_text!(
    /// The final markdown report, exactly as the synthesis stage returned it.
    BirdReport
);

impl IdentificationResult {
    /// Best-effort lookup of the `**Common Name**:` line. Only used for
    /// logging; the hand-off to later stages is always the full text.
    pub fn common_name(&self) -> Option<&str> {
        self.0.lines().find_map(|line| {
            let rest = line
                .trim()
                .trim_start_matches(['-', '*', ' '])
                .strip_prefix("Common Name")?;
            let name = rest.trim_start_matches(['*', ':', ' ']).trim();
            (!name.is_empty()).then_some(name)
        })
    }
}

impl BirdReport {
    /// UTF-8 bytes of the download artifact.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
