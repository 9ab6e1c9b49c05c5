//! Artifact resolution and inference for the H. pylori risk model
//!
//! The model is an externally trained artifact dropped into one of several
//! candidate directories. [`InferenceService`] finds it, deserializes it by
//! extension, unwraps bundled containers and drives the selected object
//! through whichever capability it exposes: class probabilities first,
//! a scalar or label prediction second.
//!
//! ```no_run
//! use hprisk_features::{encode_all, FeatureField, RawAnswers};
//! use hprisk_model::{InferenceService, ServiceConfig};
//!
//! let config = ServiceConfig {
//!     model_dir: Some("models".into()),
//!     ..ServiceConfig::default()
//! };
//! let service = InferenceService::from_config(&config, None);
//! let answers = RawAnswers::default().with(FeatureField::SnackFrequency, "1-2次/周");
//! match service.predict(&encode_all(&answers)) {
//!     Some(p) => println!("{p} ({:?})", p.verdict()),
//!     None => eprintln!("unavailable: {:?}", service.info().last_error),
//! }
//! ```

pub mod artifact;
mod bounded;
pub mod config;
pub mod error;
pub mod estimators;
pub mod frame;
pub mod model;
pub mod prediction;
pub mod service;

pub use artifact::{ArtifactLocator, DirectoryProbe, ProbeOutcome, SelectionRule};
pub use config::{ArtifactSource, ConfigError, ServiceConfig, ServiceOptions};
pub use error::{ModelError, ServiceError, Stage};
pub use frame::FeatureFrame;
pub use model::{Capabilities, Model, PredictedValue, ProbabilityScorer, ScalarPredictor};
pub use prediction::{Prediction, Verdict};
pub use service::{invoke, InferenceService, ServiceInfo, ServiceState, MISSING_FILL};
