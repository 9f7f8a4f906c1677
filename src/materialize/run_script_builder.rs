/// Utility for building the contents of a job's `run.sh` entry point.
/// Note that it modifies a String reference held internally;
/// read that String to get the script's contents.
#[derive(Debug)]
pub struct RunScriptBuilder<'a> {
    strbuf: &'a mut String,
}

impl<'a> RunScriptBuilder<'a> {
    pub fn new(strbuf: &'a mut String) -> Self {
        Self { strbuf }
    }
}

impl RunScriptBuilder<'_> {
    /// shebang line, bash options, and the batch process number
    pub fn write_prefix(&mut self) {
        self.strbuf.clear();
        self.strbuf.push_str("#!/usr/bin/env bash\nset -xeo pipefail\n\n");
        self.strbuf
            .push_str("# Batch process number, passed in by the scheduler:\nJOBNUMBER=${1:-0}\n");
    }

    /// set up the framework runtime, then cd to the job directory.
    pub fn write_environment(&mut self, cmssw_base: &str, job_dir: &str) {
        self.strbuf.push_str("\ncd ");
        self.strbuf.push_str(cmssw_base);
        self.strbuf.push_str("/src\neval `scramv1 runtime -sh`\n");
        self.strbuf.push_str("cd ");
        self.strbuf.push_str(job_dir);
        self.strbuf.push('\n');
    }

    /// run `program` with `args` and exit.
    pub fn write_command(&mut self, program: &str, args: &str) {
        self.strbuf.push('\n');
        self.strbuf.push_str(program);
        if !args.is_empty() {
            self.strbuf.push(' ');
            self.strbuf.push_str(args);
        }
        self.strbuf.push_str("\n\nexit 0\n");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_script() {
        let mut strbuf = String::new();
        let mut builder = RunScriptBuilder::new(&mut strbuf);
        builder.write_prefix();
        builder.write_environment("/cmssw", "/vd/DMR/single/d/ideal/1");
        builder.write_command("./DMRsingle", "validation.json");
        assert!(strbuf.starts_with("#!/usr/bin/env bash\n"));
        assert!(strbuf.contains("JOBNUMBER=${1:-0}\n"));
        assert!(strbuf.contains("cd /cmssw/src\neval `scramv1 runtime -sh`\ncd /vd/DMR/single/d/ideal/1\n"));
        assert!(strbuf.ends_with("\n./DMRsingle validation.json\n\nexit 0\n"));
    }
}
