use jobs::{Job, RunMode};

const DEFAULT_FLAVOUR: &str = "workday";
const REQUEST_MEMORY: &str = "2000M";

/// Utility for building the contents of a job's batch submission file.
/// Writes into a String reference held internally.
#[derive(Debug)]
pub struct SubmitFileBuilder<'a> {
    strbuf: &'a mut String,
}

impl<'a> SubmitFileBuilder<'a> {
    pub fn new(strbuf: &'a mut String) -> Self {
        Self { strbuf }
    }
}

impl SubmitFileBuilder<'_> {
    /// Whole submission file for `job`, running `executable`.
    pub fn write_job(&mut self, job: &Job, executable: &str) {
        self.strbuf.clear();
        match job.run_mode {
            RunMode::Condor => {
                self.write_kv("universe", "vanilla");
                self.write_kv("executable", executable);
                self.write_kv("arguments", "$(ProcId)");
                self.write_kv("output", "condor.$(ProcId).out");
                self.write_kv("error", "condor.$(ProcId).err");
                self.write_kv("log", "condor.log");
                self.write_quoted_kv("+JobFlavour", job.flavour.as_deref().unwrap_or(DEFAULT_FLAVOUR));
                self.write_kv("request_memory", REQUEST_MEMORY);
                self.write_kv("getenv", "true");
                self.write_queue(job.n_jobs);
            }
        }
    }

    fn write_kv(&mut self, key: &str, val: &str) {
        self.strbuf.push_str(key);
        self.strbuf.push_str(" = ");
        self.strbuf.push_str(val);
        self.strbuf.push('\n');
    }

    fn write_quoted_kv(&mut self, key: &str, val: &str) {
        self.strbuf.push_str(key);
        self.strbuf.push_str(" = \"");
        self.strbuf.push_str(val);
        self.strbuf.push_str("\"\n");
    }

    fn write_queue(&mut self, n: u32) {
        self.strbuf.push_str("queue ");
        self.strbuf.push_str(&n.to_string());
        self.strbuf.push('\n');
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use config::ValidationKind;
    use jobs::{JobKey, LocalConfig, Stage};
    use std::path::PathBuf;

    #[test]
    fn test_submit_file() {
        let key = JobKey::new(ValidationKind::JetHt, Stage::Merge).dataset("d");
        let job = Job::new(key, PathBuf::from("/vd"), "addHistograms.sh", LocalConfig::new("/out".into()))
            .with_flavour("espresso")
            .with_n_jobs(3);

        let mut strbuf = String::new();
        SubmitFileBuilder::new(&mut strbuf).write_job(&job, "run.sh");
        assert_eq!(
            strbuf,
            "universe = vanilla\n\
             executable = run.sh\n\
             arguments = $(ProcId)\n\
             output = condor.$(ProcId).out\n\
             error = condor.$(ProcId).err\n\
             log = condor.log\n\
             +JobFlavour = \"espresso\"\n\
             request_memory = 2000M\n\
             getenv = true\n\
             queue 3\n"
        );
    }
}
