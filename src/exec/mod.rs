use std::path::Path;
use std::process::Command;

use anyhow::Result;

use crate::fs::Fs;

/// Run a subprocess
mod run_cmd;
use run_cmd::run_cmd;

/// Scheduler command that submits a DAG file.
pub const SUBMIT_PROGRAM: &str = "condor_submit_dag";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Subprocess failed: {0}")]
    SubprocessFailed(String),
    #[error("Can't attach to {0} of child process")]
    NoChildStream(&'static str),
    #[error("Thread forwarding child {0} panicked")]
    ForwardingThread(&'static str),
}

/// Submit `dag_file` to the scheduler.
/// The submitter's output is shown and also kept in
/// `submit.out` and `submit.err` next to the DAG file.
pub fn submit_dag(fs: &Fs, dag_file: &Path, verbose: bool) -> Result<()> {
    let dag_dir = dag_file.parent().unwrap_or(Path::new("."));
    let mut cmd = Command::new(SUBMIT_PROGRAM);
    cmd.arg(dag_file).current_dir(dag_dir);
    log::info!("Submitting {:?}", dag_file);

    if !run_cmd(&mut cmd, dag_dir, fs, verbose)? {
        return Err(Error::SubprocessFailed(format!("{SUBMIT_PROGRAM} {}", dag_file.display())).into());
    }
    Ok(())
}
