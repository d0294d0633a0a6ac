pub mod assembler;
pub mod etl;
pub mod keys;
pub mod mapping;
pub mod navigator;
pub mod resolver;

pub use crate::domain::model::{
    Assembly, DocumentOutcome, NormalizedRecord, OutputBatch, RunSummary, StructureNotFound,
};
pub use crate::domain::ports::{ConfigProvider, PersistenceSink, Storage};
pub use crate::utils::error::Result;
