use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::error::ImageError;

/// Behavior text used when the user leaves the field empty.
pub const BEHAVIOR_NOT_SPECIFIED: &str = "Not Specified";

/// An uploaded bird photo. Only JPEG and PNG are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirdImage {
    pub bytes: Bytes,
    pub mime_type: String,
    pub filename: String,
}

impl BirdImage {
    /// Validate an upload and normalize its mime type.
    ///
    /// The declared content type wins when it names a supported format;
    /// otherwise the file extension decides.
    pub fn from_upload(
        bytes: Bytes,
        content_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let filename = filename.unwrap_or("").to_string();
        let mime_type = content_type
            .and_then(mime_from_content_type)
            .or_else(|| mime_from_extension(&filename))
            .ok_or_else(|| {
                ImageError::UnsupportedType(
                    content_type
                        .filter(|ct| !ct.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| filename.clone()),
                )
            })?;
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
            filename,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render the image as a `data:` URL for inline submission to a vision model.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }
}

fn mime_from_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        _ => None,
    }
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Everything the user submitted for one report.
#[derive(Debug, Clone)]
pub struct BirdProfile {
    pub image: BirdImage,
    pub region: String,
    pub behavior: String,
}

impl BirdProfile {
    pub fn new(image: BirdImage, region: &str, behavior: &str) -> Self {
        let behavior = behavior.trim();
        Self {
            image,
            region: region.trim().to_string(),
            behavior: if behavior.is_empty() {
                BEHAVIOR_NOT_SPECIFIED.to_string()
            } else {
                behavior.to_string()
            },
        }
    }
}
