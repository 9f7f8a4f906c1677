use std::path::{Path, PathBuf};

use super::Fs;

pub const CONDOR_SUB: &str = "condor.sub";
pub const TEMPLATED_CFG: &str = "validation_cfg.py";
pub const VALIDATION_JSON: &str = "validation.json";

/// Utility fns for making common types of paths.
/// Paths inside the validation dir take it as `vd`;
/// paths inside a job dir take the job dir as `job`.
impl Fs {
    /// $VD/executables
    pub fn executables_dir<'a>(&self, vd: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(vd, "executables", buf)
    }

    /// $VD/executables/exe_name
    pub fn executable<'a>(&self, vd: &Path, exe: &str, buf: &'a mut PathBuf) -> &'a Path {
        self.parts3(vd, "executables", exe, buf)
    }

    /// $VD/DAG
    pub fn dag_dir<'a>(&self, vd: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(vd, "DAG", buf)
    }

    /// $VD/DAG/dagFile
    pub fn dag_file<'a>(&self, vd: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts3(vd, "DAG", "dagFile", buf)
    }

    /// $VD/DAG/submit.out
    pub fn submit_stdout<'a>(&self, dag_dir: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(dag_dir, "submit.out", buf)
    }

    /// $VD/DAG/submit.err
    pub fn submit_stderr<'a>(&self, dag_dir: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(dag_dir, "submit.err", buf)
    }

    /// $JOB/validation.json
    pub fn validation_json<'a>(&self, job: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, VALIDATION_JSON, buf)
    }

    /// $JOB/validation.yaml
    pub fn validation_yaml<'a>(&self, job: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, "validation.yaml", buf)
    }

    /// $JOB/validation_cfg.py
    pub fn templated_cfg<'a>(&self, job: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, TEMPLATED_CFG, buf)
    }

    /// $JOB/run.sh
    pub fn run_sh<'a>(&self, job: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, "run.sh", buf)
    }

    /// $JOB/condor.sub
    pub fn condor_sub<'a>(&self, job: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, CONDOR_SUB, buf)
    }

    /// $JOB/file_name
    pub fn job_file<'a>(&self, job: &Path, file_name: &str, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job, file_name, buf)
    }

    fn parts2<'a, T, U>(&self, p1: T, p2: U, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        &*buf
    }

    fn parts3<'a, T, U, V>(&self, p1: T, p2: U, p3: V, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
        V: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        buf.push(p3);
        &*buf
    }
}
