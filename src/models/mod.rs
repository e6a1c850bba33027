pub mod config;
pub mod definition;
pub mod params;
pub mod report;

pub use config::{EngineConfig, LogConfig, LogFormat, LogLevel, LogOutput, PlaceholderStyle};
pub use definition::{
    OutputSpec, ParamConstraints, ParamType, ParameterSpec, ReportDefinition, SecuritySpec,
};
pub use params::{query_value, to_raw_params, ParamValue, RawParams, ValidatedParams};
pub use report::{Record, ReportMetadata, ReportResult, ReportSummary};
