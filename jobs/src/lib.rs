//! Turning a validation config into a linked pool of batch jobs,
//! and serializing that pool as a scheduler DAG.

mod job;
pub use job::{Consumes, Job, JobKey, LocalConfig, RunMode, Stage, StagedFile};

mod pool;
pub use pool::{JobId, JobPool};

mod context;
pub use context::ExpansionContext;

mod input;
pub use input::{FileListUnits, InputSource};

mod expand;
pub use expand::expand;

mod link;
pub use link::link;

mod dag;
pub use dag::DagEmitter;

/// Separates the components of a job's display name, e.g. "PV_single_ideal_minbias_1".
pub const NAME_DELIM: char = '_';

/// Default number of input files handled by one batch job.
pub const DEFAULT_FILES_PER_JOB: u32 = 5;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Duplicate job name \"{0}\"")]
    DuplicateJobName(String),
    #[error("No 'dataset' given for {0} single \"{1}\"")]
    MissingDataset(String, String),
    #[error("'filesPerJob' must be at least 1 in {0} single \"{1}\"")]
    ZeroFilesPerJob(String, String),
    #[error("File list \"{0}\" is empty")]
    EmptyFileList(String),
    #[error("File list \"{0}\", line {1}: expected \"file\" or \"run file\" like the first line")]
    MalformedFileList(String, usize),
    #[error("'{0}' must be a mapping in {1}")]
    NotAMapping(String, String),
}
