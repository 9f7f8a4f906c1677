//! Global validation configuration: data model, loading and path digestion.

mod model;
pub use model::{AlignmentSpec, GlobalConfig, Iov};

mod schema;
pub use schema::{
    GcpComparison, IovSingle, JetHtSingle, MergeBlock, PlotBlock, Stages, Validation,
    ValidationKind,
};

mod digest;
pub use digest::{digest_path, digest_value};

mod load;
pub use load::{load, parse_str, Format};

mod example;
pub use example::EXAMPLE_CONFIG;

/// Name of the stage every multi-stage validation must define.
pub const SINGLE: &str = "single";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown config extension '{0}'. Please use json/yaml format")]
    UnknownExtension(String),
    #[error("No validation found in config")]
    NoValidations,
    #[error("Unknown validation method: {0}")]
    UnknownValidation(String),
    #[error("No '{SINGLE}' key word in config for {0}")]
    MissingSingle(String),
    #[error("Environment variable '{0}' used in \"{1}\" is not set")]
    MissingEnvVar(String, String),
    #[error("Alignment \"{0}\" (used by {1}) is not defined in 'alignments'")]
    UnknownAlignment(String, String),
    #[error("Invalid name \"{0}\" in {1}: names must be non-empty and contain no whitespace, '/', '.' or '+'")]
    InvalidName(String, String),
}

/// Characters the scheduler reserves in DAG job names, plus the path separator.
const RESERVED: [char; 3] = ['/', '.', '+'];

/// True if `name` can be used as a path and job-name component.
pub fn is_valid_component(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || RESERVED.contains(&c))
}
