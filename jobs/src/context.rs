use std::path::{Path, PathBuf};

use config::{GlobalConfig, ValidationKind};

use crate::Stage;

const TOOL_PACKAGE: &str = "src/Alignment/OfflineValidation";

/// Everything expansion needs besides the config itself:
/// where jobs live, where framework files are found, and who is running.
#[derive(Debug, Clone)]
pub struct ExpansionContext {
    /// Root directory of this run's job directories.
    pub validation_dir: PathBuf,
    /// Root under which every job of this run writes its output: `<LFS>/<name>`.
    pub output_root: String,
    /// Framework release area holding templated scripts and data files.
    pub cmssw_base: PathBuf,
    /// Used to tag remote-analysis output locations.
    pub user: String,
    /// Date stamp (YYYY-MM-DD) used in remote-analysis request names.
    pub date: String,
}

impl ExpansionContext {
    pub fn new(config: &GlobalConfig, validation_dir: PathBuf, cmssw_base: PathBuf) -> Self {
        Self {
            validation_dir,
            output_root: format!("{}/{}", config.lfs.trim_end_matches('/'), config.name),
            cmssw_base,
            user: std::env::var("USER").unwrap_or_else(|_| String::from("unknown")),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Replace the user and date stamps, e.g. to get reproducible output.
    pub fn with_stamp(mut self, user: &str, date: &str) -> Self {
        self.user = user.to_owned();
        self.date = date.to_owned();
        self
    }

    /// `<validation-dir>/<kind>/<stage>/<parts...>`
    pub fn work_dir(&self, kind: ValidationKind, stage: Stage, parts: &[&str]) -> PathBuf {
        let mut dir = self.validation_dir.join(kind.as_str()).join(stage.as_str());
        for part in parts {
            dir.push(part);
        }
        dir
    }

    /// `<LFS>/<name>/<kind>/<stage>/<parts...>`
    pub fn output_dir(&self, kind: ValidationKind, stage: Stage, parts: &[&str]) -> String {
        let mut dir = format!("{}/{}/{}", self.output_root, kind, stage);
        for part in parts {
            dir.push('/');
            dir.push_str(part);
        }
        dir
    }

    /// Templated framework configuration script shipped with the release.
    pub fn template(&self, file_name: &str) -> PathBuf {
        self.package_path("python/TkAlAllInOneTool").join(file_name)
    }

    /// Data file shipped with the release.
    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.package_path("data").join(file_name)
    }

    fn package_path(&self, sub: &str) -> PathBuf {
        Path::new(&self.cmssw_base).join(TOOL_PACKAGE).join(sub)
    }
}
