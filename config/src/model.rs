use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{is_valid_component, Error, Validation, ValidationKind};

/// Top-level validation configuration, as read from a json or yaml file.
///
/// Mapping order is preserved from the input document, so that expansion
/// produces jobs (and directories) in the order the user wrote them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Run identifier; names the validation directory.
    pub name: String,
    /// Root of the large-file storage where job outputs are written.
    #[serde(rename = "LFS")]
    pub lfs: String,
    pub alignments: IndexMap<String, AlignmentSpec>,
    /// Validation kind name -> kind-specific block.
    #[serde(default)]
    pub validations: IndexMap<String, Value>,
}

/// A named set of conditions identifying one alignment scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSpec {
    /// Human-readable title, used e.g. for plot legends.
    pub title: String,
    pub globaltag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    /// Any other keys are passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlignmentSpec {
    /// Deep copy of this alignment with an additional key attached.
    pub fn with_extra(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut copy = self.clone();
        copy.extra.insert(key.to_owned(), value.into());
        copy
    }
}

/// Interval of validity: a run number or an opaque run-range label.
/// Only ever used as a grouping and path key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Iov {
    Run(u64),
    Label(String),
}

impl fmt::Display for Iov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iov::Run(run) => write!(f, "{run}"),
            Iov::Label(label) => f.write_str(label),
        }
    }
}

impl From<&Iov> for Value {
    fn from(iov: &Iov) -> Self {
        match iov {
            Iov::Run(run) => Value::from(*run),
            Iov::Label(label) => Value::from(label.as_str()),
        }
    }
}

impl GlobalConfig {
    /// Look up an alignment referenced by `user` (for error messages).
    pub fn alignment(&self, name: &str, user: &str) -> Result<&AlignmentSpec, Error> {
        self.alignments
            .get(name)
            .ok_or_else(|| Error::UnknownAlignment(name.to_owned(), user.to_owned()))
    }

    /// Parse every entry of `validations` into its kind-specific schema,
    /// in document order.
    pub fn parse_validations(&self) -> anyhow::Result<Vec<Validation>> {
        use anyhow::Context;

        if self.validations.is_empty() {
            return Err(Error::NoValidations.into());
        }

        let mut parsed = Vec::with_capacity(self.validations.len());
        for (kind_name, block) in &self.validations {
            let kind: ValidationKind = kind_name.parse()?;
            let validation = Validation::parse(kind, block.clone())
                .with_context(|| format!("while reading 'validations.{kind_name}'"))?;
            parsed.push(validation);
        }
        Ok(parsed)
    }

    /// Check that the run name and all alignment names are usable as path components.
    pub fn check_names(&self) -> Result<(), Error> {
        if !is_valid_component(&self.name) {
            return Err(Error::InvalidName(self.name.clone(), "'name'".to_owned()));
        }
        for name in self.alignments.keys() {
            if !is_valid_component(name) {
                return Err(Error::InvalidName(name.clone(), "'alignments'".to_owned()));
            }
        }
        Ok(())
    }
}
