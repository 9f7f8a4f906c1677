use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use jobs::{DagEmitter, Job, JobPool};
use util::PathEncodingError;

use crate::fs::{Fs, CONDOR_SUB, TEMPLATED_CFG, VALIDATION_JSON};
use crate::settings::ExistingDirPolicy;

mod run_script_builder;
use run_script_builder::RunScriptBuilder;

mod submit_file_builder;
use submit_file_builder::SubmitFileBuilder;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Job directory \"{0}\" already exists (remove it, or run without --no-clobber)")]
    JobDirExists(String),
}

/// Writes each job's directory to disk:
/// local config (json + yaml), executable or template link,
/// `run.sh`, the submission file, and any staged files.
/// Also writes the DAG file for the whole pool.
pub struct Materializer<'a> {
    fs: &'a Fs,
    validation_dir: &'a Path,
    cmssw_base: &'a Path,
    policy: ExistingDirPolicy,
    strbuf: String,
    pathbuf: PathBuf,
}

impl<'a> Materializer<'a> {
    pub fn new(
        fs: &'a Fs,
        validation_dir: &'a Path,
        cmssw_base: &'a Path,
        policy: ExistingDirPolicy,
    ) -> Self {
        Self {
            fs,
            validation_dir,
            cmssw_base,
            policy,
            strbuf: String::with_capacity(1024),
            pathbuf: PathBuf::with_capacity(256),
        }
    }
}

impl Materializer<'_> {
    /// With `ExistingDirPolicy::Fail`, error on the first job directory
    /// that already exists. Call before anything is written.
    pub fn check_clobber(&self, pool: &JobPool) -> Result<()> {
        if self.policy != ExistingDirPolicy::Fail {
            return Ok(());
        }
        match pool.iter().find(|job| self.fs.exists(&job.dir)) {
            Some(job) => Err(Error::JobDirExists(path_str(&job.dir)?.to_owned()).into()),
            None => Ok(()),
        }
    }

    /// Copy the executable of every non-templated job from `bin_dir`
    /// into `<validation-dir>/executables`, once per distinct executable.
    /// Returns the number of executables copied.
    pub fn stage_executables(&mut self, pool: &JobPool, bin_dir: Option<&Path>) -> Result<usize> {
        let mut exes: Vec<&str> = Vec::new();
        for job in pool.iter().filter(|job| job.template.is_none()) {
            if !exes.contains(&job.exe.as_str()) {
                exes.push(&job.exe);
            }
        }

        let fs = self.fs;
        fs.create_dir(fs.executables_dir(self.validation_dir, &mut self.pathbuf))?;

        let Some(bin_dir) = bin_dir else {
            if !exes.is_empty() {
                log::warn!("SCRAM_ARCH is not set; not staging executables {:?}", exes);
            }
            return Ok(0);
        };

        let mut n_copied = 0;
        for exe in exes {
            let src = bin_dir.join(exe);
            if !src.is_file() {
                log::warn!("Executable {:?} not found; job scripts will link to a missing file", src);
                continue;
            }
            fs.copy(&src, fs.executable(self.validation_dir, exe, &mut self.pathbuf))?;
            log::debug!("Staged executable {:?}", src);
            n_copied += 1;
        }
        Ok(n_copied)
    }

    /// Write everything `job` needs to run from its directory.
    /// Writing the same job twice produces the same bytes.
    pub fn materialize(&mut self, job: &Job) -> Result<()> {
        self.prepare_dir(&job.dir)?;
        self.fs
            .create_dir(&job.config.output)
            .with_context(|| format!("creating output directory of job {}", job.name))?;

        self.write_local_config(job)?;
        self.link_program(job)?;

        for staged in &job.staged_files {
            let fs = self.fs;
            fs.write_file(fs.job_file(&job.dir, &staged.name, &mut self.pathbuf), &staged.contents)?;
        }

        self.write_run_script(job)?;
        self.write_submit_file(job)?;
        log::debug!("Materialized job {} in {:?}", job.name, job.dir);
        Ok(())
    }

    /// Write the DAG file for `pool`, returning its path.
    pub fn write_dag(&mut self, pool: &JobPool) -> Result<PathBuf> {
        let fs = self.fs;
        fs.create_dir(fs.dag_dir(self.validation_dir, &mut self.pathbuf))?;
        DagEmitter::new(&mut self.strbuf).write_pool(pool, CONDOR_SUB)?;
        let dag_file = fs.dag_file(self.validation_dir, &mut self.pathbuf);
        fs.write_file(dag_file, &self.strbuf)?;
        Ok(dag_file.to_path_buf())
    }

    fn prepare_dir(&self, dir: &Path) -> Result<()> {
        if self.fs.exists(dir) {
            match self.policy {
                ExistingDirPolicy::Reuse => log::debug!("Reusing job directory {:?}", dir),
                ExistingDirPolicy::Replace => {
                    log::info!("Deleting existing job directory {:?}", dir);
                    self.fs.delete_dir(dir)?;
                }
                ExistingDirPolicy::Fail => {
                    return Err(Error::JobDirExists(path_str(dir)?.to_owned()).into());
                }
            }
        }
        self.fs.create_dir(dir)
    }

    fn write_local_config(&mut self, job: &Job) -> Result<()> {
        let fs = self.fs;

        self.strbuf.clear();
        self.strbuf.push_str(
            &serde_json::to_string_pretty(&job.config)
                .with_context(|| format!("serializing local config of job {}", job.name))?,
        );
        self.strbuf.push('\n');
        fs.write_file(fs.validation_json(&job.dir, &mut self.pathbuf), &self.strbuf)?;

        let yaml = serde_yaml::to_string(&job.config)
            .with_context(|| format!("serializing local config of job {}", job.name))?;
        fs.write_file(fs.validation_yaml(&job.dir, &mut self.pathbuf), &yaml)?;
        Ok(())
    }

    /// Templated jobs get `validation_cfg.py` pointing at the template;
    /// the rest get a link named after their executable.
    fn link_program(&mut self, job: &Job) -> Result<()> {
        let fs = self.fs;
        match &job.template {
            Some(template) => {
                fs.symlink(template, fs.templated_cfg(&job.dir, &mut self.pathbuf))?;
            }
            None => {
                let exe = fs.executable(self.validation_dir, &job.exe, &mut PathBuf::new()).to_path_buf();
                fs.symlink(&exe, fs.job_file(&job.dir, &job.exe, &mut self.pathbuf))?;
            }
        }
        Ok(())
    }

    fn write_run_script(&mut self, job: &Job) -> Result<()> {
        let (program, args) = command(job);
        let mut builder = RunScriptBuilder::new(&mut self.strbuf);
        builder.write_prefix();
        builder.write_environment(path_str(self.cmssw_base)?, path_str(&job.dir)?);
        builder.write_command(&program, &args);

        let fs = self.fs;
        fs.write_script(fs.run_sh(&job.dir, &mut self.pathbuf), &self.strbuf)
    }

    fn write_submit_file(&mut self, job: &Job) -> Result<()> {
        SubmitFileBuilder::new(&mut self.strbuf).write_job(job, "run.sh");
        let fs = self.fs;
        fs.write_file(fs.condor_sub(&job.dir, &mut self.pathbuf), &self.strbuf)
    }
}

/// Program and arguments `run.sh` executes for `job`.
fn command(job: &Job) -> (String, String) {
    let program = match job.template {
        Some(_) => job.exe.clone(),
        None => format!("./{}", job.exe),
    };
    let args = match (&job.arguments, &job.template) {
        (Some(args), _) => args.clone(),
        (None, Some(_)) => format!("{TEMPLATED_CFG} config={VALIDATION_JSON}"),
        (None, None) => VALIDATION_JSON.to_owned(),
    };
    (program, args)
}

fn path_str(path: &Path) -> Result<&str, PathEncodingError> {
    path.to_str().ok_or(PathEncodingError)
}
