//! The three-stage report pipeline: identify the bird from its photo,
//! research it on the web, then synthesize a birdwatching guide.

pub mod agent;
pub mod backend;
pub mod connector;
pub mod error;
pub mod pipeline;
pub mod search;

pub use connector::{Connector, HttpConnector, MockConnector};
pub use error::{PipelineError, Stage};
pub use pipeline::{ModelSelection, ReportPipeline};
