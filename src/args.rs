use clap::{ArgAction, Parser};

const CMD_NAME: &str = "valdag";
const DEFAULT_CMSSW_BASE: &str = ".";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = "Create and submit alignment validation job DAGs", long_about = None)]
pub struct Args {
    /// Validation config file (.json, .yaml or .yml)
    #[arg(value_name = "CONFIG", required_unless_present = "example")]
    pub config: Option<String>,

    /// Dry run; create all job directories but don't submit the DAG
    #[arg(short, long)]
    pub dry: bool,

    /// Print additional info (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print an example config file and exit
    #[arg(short, long)]
    pub example: bool,

    /// Delete existing job directories before recreating them
    #[arg(short, long, conflicts_with = "no_clobber")]
    pub force: bool,

    /// Fail if a job directory already exists
    #[arg(long)]
    pub no_clobber: bool,

    /// Directory the validation directory is created in [default: <CMSSW_BASE>/src]
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "VALDAG_OUTPUT")]
    pub output: Option<String>,

    /// Framework release area with templated configs, data files and binaries
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CMSSW_BASE)]
    #[arg(env = "CMSSW_BASE")]
    pub cmssw_base: String,

    /// Platform tag; binaries are taken from <CMSSW_BASE>/bin/<ARCH>
    #[arg(long, value_name = "ARCH")]
    #[arg(env = "SCRAM_ARCH")]
    pub scram_arch: Option<String>,
}
