use std::path::Path;

use colored::Colorize;

use util::Timer;

use crate::settings::Settings;

/// User-facing progress output. Everything goes to stderr,
/// so stdout stays clean for `--example`.
pub struct Ui {
    /// -v setting, displays progress and timings
    pub verbose: bool,
    dry_run: bool,
    /// keeps track of time for each stage of the run
    timer: Timer,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            dry_run: settings.dry_run,
            timer: Timer::now(),
        }
    }

    pub fn start_timer(&mut self) {
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&self, stage: &str) {
        if self.verbose {
            self.timer.print_elapsed(stage);
        }
    }

    /// Start of a step, finished by `done`.
    pub fn step(&self, msg: &str) {
        if self.verbose {
            eprint!("{}... ", msg.magenta());
        }
    }

    pub fn step_path(&self, msg: &str, path: &Path) {
        if self.verbose {
            eprint!("{} {:?}... ", msg.magenta(), path);
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    pub fn expanded(&self, n_jobs: usize, n_edges: usize) {
        if self.verbose {
            eprintln!("{} {n_jobs} jobs, {n_edges} dependencies", "Expanded".cyan());
        }
    }

    /// Always printed: where the DAG is, and whether it went to the scheduler.
    pub fn summary(&self, n_jobs: usize, dag_file: &Path) {
        let action = if self.dry_run { "Wrote (dry run, not submitting)" } else { "Wrote" };
        eprintln!("{} {n_jobs} jobs, DAG file {:?}", action.green(), dag_file);
    }
}
