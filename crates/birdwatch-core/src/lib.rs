pub mod credentials;
pub mod error;
pub mod profile;
pub mod report;
pub mod session;

pub use credentials::{CredentialUpdate, Credentials};
pub use error::{ImageError, MissingInput};
pub use profile::{BirdImage, BirdProfile, BEHAVIOR_NOT_SPECIFIED};
pub use report::{BirdReport, IdentificationResult, ResearchLinks, REPORT_FILENAME, REPORT_MIME};
pub use session::{CachedReport, SessionContext};
