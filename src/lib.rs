//! GPS trajectory core for activity replay: turns recorded activity streams
//! into a dense, time-ordered trajectory and answers time, position and
//! window queries against it.

pub mod config;
pub mod error;
pub mod geodesy;
pub mod pipeline;
pub mod processor;
pub mod selection;
pub mod store;
pub mod streams;
pub mod types;

pub use config::ProcessorConfig;
pub use error::{TrackError, TrackResult};
pub use pipeline::build_trajectory;
pub use processor::TrajectoryProcessor;
pub use selection::{select_by_interval, DensityPreset, IntelligentSelection};
pub use store::Trajectory;
pub use streams::SampleColumns;
pub use types::{RawSample, TrajectoryPoint};
