use std::path::Path;

use util::PathEncodingError;

use crate::JobPool;

/// Builds the text of a scheduler DAG file.
/// Like the other builders, it writes into a String reference held internally.
///
/// Grammar:
/// ```text
/// JOB <name> <submit-file> DIR <job-dir>
/// ...
///
/// PARENT <parent> [<parent> ...] CHILD <name>
/// ```
#[derive(Debug)]
pub struct DagEmitter<'a> {
    strbuf: &'a mut String,
}

impl<'a> DagEmitter<'a> {
    pub fn new(strbuf: &'a mut String) -> Self {
        Self { strbuf }
    }
}

impl DagEmitter<'_> {
    /// Write every job in `pool`: all JOB records first, then a blank line,
    /// then one PARENT/CHILD record per job that has dependencies.
    pub fn write_pool(&mut self, pool: &JobPool, submit_file: &str) -> Result<(), PathEncodingError> {
        self.strbuf.clear();
        for job in pool.iter() {
            self.write_job(&job.name, submit_file, &job.dir)?;
        }
        self.strbuf.push('\n');
        for job in pool.iter() {
            if !job.dependencies.is_empty() {
                self.write_parents(&job.dependencies, &job.name);
            }
        }
        Ok(())
    }

    fn write_job(&mut self, name: &str, submit_file: &str, dir: &Path) -> Result<(), PathEncodingError> {
        self.strbuf.push_str("JOB ");
        self.strbuf.push_str(name);
        self.strbuf.push(' ');
        self.strbuf.push_str(submit_file);
        self.strbuf.push_str(" DIR ");
        self.strbuf.push_str(dir.to_str().ok_or(PathEncodingError)?);
        self.strbuf.push('\n');
        Ok(())
    }

    fn write_parents(&mut self, parents: &[String], child: &str) {
        self.strbuf.push_str("PARENT");
        for parent in parents {
            self.strbuf.push(' ');
            self.strbuf.push_str(parent);
        }
        self.strbuf.push_str(" CHILD ");
        self.strbuf.push_str(child);
        self.strbuf.push('\n');
    }
}
