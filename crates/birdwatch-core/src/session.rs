use chrono::{DateTime, Duration, Utc};

use crate::credentials::Credentials;
use crate::error::MissingInput;
use crate::profile::BirdImage;
use crate::report::BirdReport;

/// The report currently on display, paired with the image it was generated from.
#[derive(Debug, Clone)]
pub struct CachedReport {
    pub report: BirdReport,
    pub image: BirdImage,
    pub generated_at: DateTime<Utc>,
}

/// Per-session state: the user's keys and at most one cached report.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub credentials: Credentials,
    pub current: Option<CachedReport>,
    pub last_seen: DateTime<Utc>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            current: None,
            last_seen: Utc::now(),
        }
    }
}

impl SessionContext {
    /// Check everything a submission needs before any remote call is made.
    ///
    /// Order matters: the model key is reported first, then the search key,
    /// then the image. Hands the image back when everything is present.
    pub fn check_submission(&self, image: Option<BirdImage>) -> Result<BirdImage, MissingInput> {
        self.check_credentials()?;
        match image {
            Some(img) if !img.is_empty() => Ok(img),
            _ => Err(MissingInput::Image),
        }
    }

    pub fn check_credentials(&self) -> Result<(), MissingInput> {
        if self.credentials.model_key().is_none() {
            return Err(MissingInput::ModelKey);
        }
        if self.credentials.search_key().is_none() {
            return Err(MissingInput::SearchKey);
        }
        Ok(())
    }

    /// Replace the cached report and its image together.
    pub fn replace_report(&mut self, report: BirdReport, image: BirdImage) {
        self.current = Some(CachedReport {
            report,
            image,
            generated_at: Utc::now(),
        });
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_seen > ttl
    }
}
