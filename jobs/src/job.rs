use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use config::{AlignmentSpec, Iov, ValidationKind};

use crate::NAME_DELIM;

/// Position of a job in a validation pipeline.
/// Dependencies only ever point from a later stage to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Single,
    Merge,
    Plot,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Single => "single",
            Stage::Merge => "merge",
            Stage::Plot => "plot",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution backend of a job. Only batch submission is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Condor,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Condor => f.write_str("Condor"),
        }
    }
}

/// Structured identity of a job, used for dependency matching.
///
/// The display name is derived from this, never the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub kind: ValidationKind,
    pub stage: Stage,
    pub alignment: Option<String>,
    /// Dataset or variant name.
    pub dataset: Option<String>,
    pub iov: Option<Iov>,
}

impl JobKey {
    pub fn new(kind: ValidationKind, stage: Stage) -> Self {
        Self {
            kind,
            stage,
            alignment: None,
            dataset: None,
            iov: None,
        }
    }

    pub fn alignment(mut self, alignment: &str) -> Self {
        self.alignment = Some(alignment.to_owned());
        self
    }

    pub fn dataset(mut self, dataset: &str) -> Self {
        self.dataset = Some(dataset.to_owned());
        self
    }

    pub fn iov(mut self, iov: &Iov) -> Self {
        self.iov = Some(iov.clone());
        self
    }

    /// "<kind>_<stage>[_<alignment>][_<dataset>][_<iov>]"
    pub fn display_name(&self) -> String {
        let mut name = String::with_capacity(64);
        name.push_str(self.kind.as_str());
        name.push(NAME_DELIM);
        name.push_str(self.stage.as_str());
        for part in [&self.alignment, &self.dataset].into_iter().flatten() {
            name.push(NAME_DELIM);
            name.push_str(part);
        }
        if let Some(iov) = &self.iov {
            name.push(NAME_DELIM);
            name.push_str(&iov.to_string());
        }
        name
    }
}

/// Which earlier-stage jobs a merge or plot job reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumes {
    pub stage: Stage,
    /// Inclusion list ("singles" or "merges").
    pub datasets: Vec<String>,
    /// If non-empty, only jobs for one of these alignments match.
    pub alignments: Vec<String>,
    /// If set, only jobs for this interval match.
    pub iov: Option<Iov>,
}

impl Consumes {
    pub fn new(stage: Stage, datasets: &[String]) -> Self {
        Self {
            stage,
            datasets: datasets.to_vec(),
            alignments: Vec::new(),
            iov: None,
        }
    }

    /// Exact-match test of an earlier job's key against this selector.
    pub fn matches(&self, kind: ValidationKind, key: &JobKey) -> bool {
        key.kind == kind
            && key.stage == self.stage
            && key
                .dataset
                .as_ref()
                .is_some_and(|dataset| self.datasets.contains(dataset))
            && (self.alignments.is_empty()
                || key.alignment.as_ref().is_some_and(|a| self.alignments.contains(a)))
            && (self.iov.is_none() || self.iov == key.iov)
    }
}

/// The per-job configuration written to `validation.json`.
///
/// Alignments are owned copies, so attaching e.g. an input file to one
/// job's alignment never shows up in another job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory the job writes its results to.
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub alignments: IndexMap<String, AlignmentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Map<String, Value>>,
    /// Stage-specific extras.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocalConfig {
    pub fn new(output: String) -> Self {
        Self {
            output,
            alignment: None,
            alignments: IndexMap::new(),
            validation: None,
            extra: Map::new(),
        }
    }
}

/// An extra file written verbatim into the job directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub contents: String,
}

/// One batch job: the unit that gets a directory, a submit file and a DAG node.
#[derive(Debug, Clone)]
pub struct Job {
    pub key: JobKey,
    /// Unique within a run; used as the DAG node name.
    pub name: String,
    /// Working directory.
    pub dir: PathBuf,
    /// Logical name of the executable.
    pub exe: String,
    pub run_mode: RunMode,
    /// Templated configuration script, for jobs run through the framework executable.
    pub template: Option<PathBuf>,
    /// Explicit argument string, overriding the default convention.
    pub arguments: Option<String>,
    /// Number of batch processes this job is split into.
    pub n_jobs: u32,
    /// Batch queue flavour, if not the default.
    pub flavour: Option<String>,
    pub config: LocalConfig,
    pub consumes: Option<Consumes>,
    pub staged_files: Vec<StagedFile>,
    /// Names of jobs that must complete first. Filled in by `link`.
    pub dependencies: Vec<String>,
}

impl Job {
    pub fn new(key: JobKey, dir: PathBuf, exe: &str, config: LocalConfig) -> Self {
        Self {
            name: key.display_name(),
            key,
            dir,
            exe: exe.to_owned(),
            run_mode: RunMode::default(),
            template: None,
            arguments: None,
            n_jobs: 1,
            flavour: None,
            config,
            consumes: None,
            staged_files: Vec::with_capacity(0),
            dependencies: Vec::with_capacity(0),
        }
    }

    pub fn with_template(mut self, template: PathBuf) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_arguments(mut self, arguments: String) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: u32) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn with_flavour(mut self, flavour: &str) -> Self {
        self.flavour = Some(flavour.to_owned());
        self
    }

    pub fn consuming(mut self, consumes: Consumes) -> Self {
        self.consumes = Some(consumes);
        self
    }

    pub fn with_staged_file(mut self, name: &str, contents: String) -> Self {
        self.staged_files.push(StagedFile {
            name: name.to_owned(),
            contents,
        });
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_display_name() {
        let key = JobKey::new(ValidationKind::Pv, Stage::Single)
            .alignment("ideal")
            .dataset("minbias")
            .iov(&Iov::Run(315257));
        assert_eq!(key.display_name(), "PV_single_ideal_minbias_315257");

        let key = JobKey::new(ValidationKind::JetHt, Stage::Plot).dataset("jetht");
        assert_eq!(key.display_name(), "JetHT_plot_jetht");
    }

    #[test]
    fn test_underscores_do_not_confuse_matching() {
        // "a_b" + "c" and "a" + "b_c" share a display prefix but not a key.
        let single = JobKey::new(ValidationKind::Dmr, Stage::Single)
            .alignment("a_b")
            .dataset("c");
        let consumes = Consumes::new(Stage::Single, &["b_c".to_owned()]);
        assert!(!consumes.matches(ValidationKind::Dmr, &single));
        let consumes = Consumes::new(Stage::Single, &["c".to_owned()]);
        assert!(consumes.matches(ValidationKind::Dmr, &single));
    }

    #[test]
    fn test_consumes_constraints() {
        let key = JobKey::new(ValidationKind::JetHt, Stage::Single)
            .alignment("ideal")
            .dataset("d");
        let mut consumes = Consumes::new(Stage::Single, &["d".to_owned()]);
        consumes.alignments = vec!["prompt".to_owned()];
        assert!(!consumes.matches(ValidationKind::JetHt, &key));
        consumes.alignments = vec!["prompt".to_owned(), "ideal".to_owned()];
        assert!(consumes.matches(ValidationKind::JetHt, &key));
        assert!(!consumes.matches(ValidationKind::Dmr, &key));
        consumes.stage = Stage::Merge;
        assert!(!consumes.matches(ValidationKind::JetHt, &key));
    }

    #[test]
    fn test_local_config_round_trip() -> Result<()> {
        let alignment: AlignmentSpec = serde_json::from_value(serde_json::json!({
            "title": "Ideal", "globaltag": "gt", "conditions": { "rcd": "tag" }
        }))?;
        let mut config = LocalConfig::new("/lfs/run/PV/single/d/ideal/1".to_owned());
        config.alignment = Some(alignment.clone());
        config
            .alignments
            .insert("ideal".to_owned(), alignment.with_extra("file", "/x"));
        let mut validation = Map::new();
        validation.insert("IOV".to_owned(), Value::from(1));
        config.validation = Some(validation);
        config
            .extra
            .insert("runsInFiles".to_owned(), serde_json::json!(["55", "56"]));

        let text = serde_json::to_string_pretty(&config)?;
        let reloaded: LocalConfig = serde_json::from_str(&text)?;
        assert_eq!(reloaded, config);
        Ok(())
    }
}
