use std::path::PathBuf;

use anyhow::Result;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config file \"{0}\" does not exist")]
    ConfigNotFound(String),
    #[error("No config file given")]
    NoConfig,
}

/// What to do when a job directory is left over from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingDirPolicy {
    /// Overwrite files in place.
    #[default]
    Reuse,
    /// Delete the directory and start over (`--force`).
    Replace,
    /// Abort the run (`--no-clobber`).
    Fail,
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    /// `None` only when printing the example config.
    pub config: Option<PathBuf>,
    /// The validation directory is created in here.
    pub output: PathBuf,
    pub cmssw_base: PathBuf,
    /// Where the validation binaries are copied from, if known.
    pub bin_dir: Option<PathBuf>,
    pub verbose: u8,
    pub dry_run: bool,
    pub example: bool,
    pub existing_dirs: ExistingDirPolicy,
}

impl Settings {
    pub fn config(&self) -> Result<&PathBuf, Error> {
        self.config.as_ref().ok_or(Error::NoConfig)
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = match (&args.config, args.example) {
            (_, true) => None,
            (Some(config), false) => {
                let config = PathBuf::from(config);
                if !config.exists() {
                    return Err(Error::ConfigNotFound(config.to_string_lossy().into_owned()).into());
                }
                Some(config.canonicalize()?)
            }
            (None, false) => return Err(Error::NoConfig.into()),
        };

        let mut cmssw_base = PathBuf::from(&args.cmssw_base);
        if cmssw_base.exists() {
            cmssw_base = cmssw_base.canonicalize()?;
        }

        let output = match &args.output {
            Some(output) => PathBuf::from(output),
            None => cmssw_base.join("src"),
        };

        let bin_dir = args
            .scram_arch
            .as_ref()
            .map(|arch| cmssw_base.join("bin").join(arch));

        let existing_dirs = if args.force {
            ExistingDirPolicy::Replace
        } else if args.no_clobber {
            ExistingDirPolicy::Fail
        } else {
            ExistingDirPolicy::Reuse
        };

        Ok(Self {
            config,
            output,
            cmssw_base,
            bin_dir,
            verbose: args.verbose,
            dry_run: args.dry,
            example: args.example,
            existing_dirs,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("val.json");
        std::fs::write(&config, "{}")?;
        let base = dir.path().to_string_lossy().into_owned();

        let args = Args::try_parse_from([
            "valdag",
            config.to_str().unwrap_or_default(),
            "--cmssw-base",
            base.as_str(),
            "--scram-arch",
            "el8_amd64_gcc11",
        ])?;
        let settings = Settings::try_from(args)?;
        let base = dir.path().canonicalize()?;
        assert_eq!(settings.output, base.join("src"));
        assert_eq!(settings.bin_dir, Some(base.join("bin/el8_amd64_gcc11")));
        assert_eq!(settings.existing_dirs, ExistingDirPolicy::Reuse);
        assert!(settings.config()?.is_absolute());
        Ok(())
    }

    #[test]
    fn test_missing_config() -> Result<()> {
        let args = Args::try_parse_from(["valdag", "/nonexistent/val.yaml", "--no-clobber"])?;
        let err = Settings::try_from(args).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ConfigNotFound(_))));
        Ok(())
    }
}
