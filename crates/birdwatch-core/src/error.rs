use thiserror::Error;

/// A required input that was absent when the user asked for a report.
///
/// These are checked before any remote call is made; each maps to the
/// message shown inline on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingInput {
    #[error("Please provide your OpenAI API key in the sidebar.")]
    ModelKey,

    #[error("Please provide your SerpAPI key in the sidebar.")]
    SearchKey,

    #[error("Please upload a bird image before generating the report.")]
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("uploaded image is empty")]
    Empty,

    #[error("unsupported image type: {0} (expected JPEG or PNG)")]
    UnsupportedType(String),
}
