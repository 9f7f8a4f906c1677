use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;

use crate::Error;

/// `/primary/processed/tier`: three non-empty, dot-free segments.
static DATASET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[^/.]+/[^/.]+/[^/.]+$").expect("valid regex"));

/// What a single-stage `dataset` string refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource<'a> {
    /// A catalog dataset, processed whole by the remote-analysis backend.
    Dataset(&'a str),
    /// A local text file listing input files.
    FileList(&'a str),
}

impl<'a> InputSource<'a> {
    /// Pure string classification; nothing is looked up.
    pub fn classify(input: &'a str) -> Self {
        if DATASET_RE.is_match(input) {
            Self::Dataset(input)
        } else {
            Self::FileList(input)
        }
    }
}

/// Splitting units found in a file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileListUnits {
    /// One file per line.
    Files(Vec<String>),
    /// "run file" per line: files grouped by run, runs in first-seen order.
    Runs(IndexMap<String, Vec<String>>),
}

impl FileListUnits {
    pub fn read(path: &str) -> Result<Self> {
        let text = fs::read_to_string(Path::new(path))
            .with_context(|| format!("while reading file list {:?}", path))?;
        Ok(Self::parse(&text, path)?)
    }

    /// Parse file list text. The first non-blank line decides the format,
    /// and every other non-blank line must have the same number of tokens.
    pub fn parse(text: &str, path: &str) -> Result<Self, Error> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, first)) = lines.clone().next() else {
            return Err(Error::EmptyFileList(path.to_owned()));
        };
        let width = first.split_whitespace().count();

        match width {
            1 => {
                let mut files = Vec::new();
                for (i, line) in lines {
                    let mut tokens = line.split_whitespace();
                    match (tokens.next(), tokens.next()) {
                        (Some(file), None) => files.push(file.to_owned()),
                        _ => return Err(Error::MalformedFileList(path.to_owned(), i + 1)),
                    }
                }
                Ok(Self::Files(files))
            }
            2 => {
                let mut runs: IndexMap<String, Vec<String>> = IndexMap::new();
                for (i, line) in lines {
                    let mut tokens = line.split_whitespace();
                    match (tokens.next(), tokens.next(), tokens.next()) {
                        (Some(run), Some(file), None) => {
                            runs.entry(run.to_owned()).or_default().push(file.to_owned())
                        }
                        _ => return Err(Error::MalformedFileList(path.to_owned(), i + 1)),
                    }
                }
                Ok(Self::Runs(runs))
            }
            _ => {
                let line = lines.next().map(|(i, _)| i + 1).unwrap_or(1);
                Err(Error::MalformedFileList(path.to_owned(), line))
            }
        }
    }

    /// Number of splitting units: files, or distinct runs.
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Files(files) => files.len(),
            Self::Runs(runs) => runs.len(),
        }
    }

    /// Distinct runs in first-seen order; empty for plain file lists.
    pub fn runs(&self) -> Vec<&str> {
        match self {
            Self::Files(_) => Vec::with_capacity(0),
            Self::Runs(runs) => runs.keys().map(String::as_str).collect(),
        }
    }

    /// One job per run, or ceil(files / files_per_job).
    pub fn job_count(&self, files_per_job: u32) -> u32 {
        let units = self.unit_count() as u32;
        match self {
            Self::Runs(_) => units,
            Self::Files(_) => units.div_ceil(files_per_job.max(1)),
        }
    }
}
