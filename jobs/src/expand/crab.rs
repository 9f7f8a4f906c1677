//! Remote-analysis (CRAB) configuration attached to JetHT single jobs.

use crate::InputSource;

pub(super) struct CrabRequest<'a> {
    pub dataset: &'a str,
    pub alignment: &'a str,
    pub input: InputSource<'a>,
    pub files_per_job: u32,
    pub user: &'a str,
    pub date: &'a str,
}

impl CrabRequest<'_> {
    /// Lines of the CRAB configuration script.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::with_capacity(40);
        let mut push = |line: String| lines.push(line);

        push("from WMCore.Configuration import Configuration".into());
        push("config = Configuration()".into());
        push(String::new());
        if let InputSource::FileList(list) = self.input {
            push(format!("inputList = '{list}'"));
        }
        push(format!(
            "jobTag = 'TkAlJetHTAnalysis_single_{}_{}_{}'",
            self.dataset, self.alignment, self.date
        ));
        push(String::new());

        push("config.section_(\"General\")".into());
        push("config.General.requestName = jobTag".into());
        push("config.General.workArea = config.General.requestName".into());
        push("config.General.transferOutputs = True".into());
        push("config.General.transferLogs = False".into());
        push(String::new());

        push("config.section_(\"JobType\")".into());
        push("config.JobType.pluginName = 'Analysis'".into());
        push("config.JobType.psetName = 'validation_cfg.py'".into());
        push("config.JobType.pyCfgParams = ['config=validation.json', 'runType=crab']".into());
        push("config.JobType.inputFiles = ['validation.json']".into());
        push("config.JobType.numCores = 1".into());
        push("config.JobType.maxMemoryMB = 1200".into());
        push("config.JobType.maxJobRuntimeMin = 900".into());
        push(String::new());

        push("config.section_(\"Data\")".into());
        match self.input {
            InputSource::Dataset(dataset) => {
                push(format!("config.Data.inputDataset = '{dataset}'"));
                push("config.Data.inputDBS = 'global'".into());
            }
            InputSource::FileList(_) => {
                push("config.Data.userInputFiles = open(inputList).readlines()".into());
                push("config.Data.totalUnits = len(config.Data.userInputFiles)".into());
            }
        }
        push("config.Data.splitting = 'FileBased'".into());
        push(format!("config.Data.unitsPerJob = {}", self.files_per_job));
        if let InputSource::FileList(_) = self.input {
            push("config.Data.outputPrimaryDataset = 'AlignmentValidationJetHT'".into());
        }
        push(format!(
            "config.Data.outLFNDirBase = '/store/group/alca_trackeralign/{}/' + config.General.requestName",
            self.user
        ));
        push("config.Data.publication = False".into());
        push(String::new());

        push("config.section_(\"Site\")".into());
        push("config.Site.whitelist = ['T2_CH_*','T2_DE_*','T2_FR_*','T2_IT_*']".into());
        push("config.Site.storageSite = 'T2_CH_CERN'".into());

        lines
    }
}
