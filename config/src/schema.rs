use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::{Error, Iov};

/// The validation kinds we know how to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// Geometry comparison
    Gcp,
    /// Distribution of median residuals
    Dmr,
    /// Primary vertex
    Pv,
    JetHt,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Gcp => "GCP",
            ValidationKind::Dmr => "DMR",
            ValidationKind::Pv => "PV",
            ValidationKind::JetHt => "JetHT",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GCP" => Ok(ValidationKind::Gcp),
            "DMR" => Ok(ValidationKind::Dmr),
            "PV" => Ok(ValidationKind::Pv),
            "JetHT" => Ok(ValidationKind::JetHt),
            other => Err(Error::UnknownValidation(other.to_owned())),
        }
    }
}

/// A parsed `validations.<kind>` block.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Gcp(IndexMap<String, GcpComparison>),
    Dmr(Stages<IovSingle>),
    Pv(Stages<IovSingle>),
    JetHt(Stages<JetHtSingle>),
}

impl Validation {
    pub fn parse(kind: ValidationKind, block: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ValidationKind::Gcp => Validation::Gcp(serde_json::from_value(block)?),
            ValidationKind::Dmr => Validation::Dmr(serde_json::from_value(block)?),
            ValidationKind::Pv => Validation::Pv(serde_json::from_value(block)?),
            ValidationKind::JetHt => Validation::JetHt(serde_json::from_value(block)?),
        })
    }

    pub fn kind(&self) -> ValidationKind {
        match self {
            Validation::Gcp(_) => ValidationKind::Gcp,
            Validation::Dmr(_) => ValidationKind::Dmr,
            Validation::Pv(_) => ValidationKind::Pv,
            Validation::JetHt(_) => ValidationKind::JetHt,
        }
    }
}

/// single -> merge -> plot stages of a multi-stage validation.
///
/// `single` is mandatory, but it is kept optional here so that its absence
/// can be reported as a configuration error naming the validation kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stages<S> {
    pub single: Option<IndexMap<String, S>>,
    pub merge: Option<IndexMap<String, MergeBlock>>,
    pub plot: Option<IndexMap<String, PlotBlock>>,
}

impl<S> Stages<S> {
    /// The mandatory single-stage variants.
    pub fn singles(&self, kind: ValidationKind) -> Result<&IndexMap<String, S>, Error> {
        self.single
            .as_ref()
            .ok_or_else(|| Error::MissingSingle(kind.to_string()))
    }
}

/// A single-stage variant iterated over intervals and alignments (DMR, PV).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IovSingle {
    #[serde(rename = "IOV", deserialize_with = "one_or_many")]
    pub iovs: Vec<Iov>,
    pub alignments: Vec<String>,
    /// Everything else is opaque and copied into the job config.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A JetHT single-stage variant: no intervals, split by input units instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JetHtSingle {
    pub alignments: Vec<String>,
    /// CMS dataset name or path to a file list.
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default, rename = "filesPerJob")]
    pub files_per_job: Option<u32>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A merge-stage variant consuming the single variants named in `singles`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MergeBlock {
    pub singles: Vec<String>,
    #[serde(default)]
    pub alignments: Vec<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A plot-stage variant consuming the merge variants named in `merges`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotBlock {
    pub merges: Vec<String>,
    #[serde(default)]
    pub alignments: Vec<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A GCP comparison between a reference and a test alignment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GcpComparison {
    #[serde(rename = "IOV", deserialize_with = "one_or_many")]
    pub iovs: Vec<Iov>,
    pub reference: String,
    pub test: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Accept both `IOV: 1` and `IOV: [1, 2]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Iov>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Iov),
        Many(Vec<Iov>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(iov) => vec![iov],
        OneOrMany::Many(iovs) => iovs,
    })
}
