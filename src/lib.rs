pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, SqliteSink};
pub use config::toml_config::TomlConfig;
pub use core::{
    assembler::RecordAssembler, etl::EtlEngine, mapping::MappingTable,
    navigator::DocumentNavigator, resolver::SegmentResolver,
};
pub use domain::model::{NormalizedRecord, UnmappedPolicy};
pub use utils::error::{EtlError, Result};
