pub mod consistency;
pub mod etl;
pub mod pipeline_sequence;
pub mod rubric;
pub mod scoring;
pub mod synthesis;
pub mod tiers;

pub use crate::domain::model::PhaseOutput;
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
