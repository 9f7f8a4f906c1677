use std::path::Path;

use anyhow::{Context, Result};

use jobs::ExpansionContext;

use crate::exec;
use crate::fs::Fs;
use crate::materialize::Materializer;
use crate::settings::Settings;
use crate::ui::Ui;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, fs: Fs::new(), ui }
    }

    /// Run the app: load the config, expand and link its jobs,
    /// write every job directory and the DAG file, then submit
    /// unless this is a dry run.
    pub fn run(mut self) -> Result<()> {
        if self.settings.example {
            print!("{}", config::EXAMPLE_CONFIG);
            return Ok(());
        }

        self.ui.start_timer();
        let config_path = self.settings.config()?.clone();
        self.ui.step_path("Loading config", &config_path);
        let config = config::load(&config_path)?;
        self.ui.done();

        let validation_dir = std::path::absolute(self.settings.output.join(&config.name))
            .context("resolving validation directory")?;
        log::info!("Using validation directory {:?}", validation_dir);

        // everything that can fail on a bad config happens before we touch disk:
        self.ui.step("Expanding jobs");
        let ctx = ExpansionContext::new(&config, validation_dir.clone(), self.settings.cmssw_base.clone());
        let mut pool = jobs::expand(&config, &ctx)?;
        let n_edges = jobs::link(&mut pool);
        self.ui.done();
        self.ui.expanded(pool.len(), n_edges);
        self.ui.print_elapsed("Expansion");

        let cmssw_base = self.settings.cmssw_base.clone();
        let policy = self.settings.existing_dirs;
        Materializer::new(&self.fs, &validation_dir, &cmssw_base, policy).check_clobber(&pool)?;

        let verbose = self.ui.verbose;
        self.fs.allow(&validation_dir, verbose)?;
        self.fs.allow(Path::new(&ctx.output_root), verbose)?;

        self.ui.start_timer();
        let mut mat = Materializer::new(&self.fs, &validation_dir, &cmssw_base, policy);
        let n_exes = mat.stage_executables(&pool, self.settings.bin_dir.as_deref())?;
        log::info!("Staged {n_exes} executables");

        for job in pool.iter() {
            mat.materialize(job)
                .with_context(|| format!("while writing job {}", job.name))?;
        }
        let dag_file = mat.write_dag(&pool)?;
        self.ui.print_elapsed("Writing jobs");
        self.ui.summary(pool.len(), &dag_file);

        if !self.settings.dry_run {
            exec::submit_dag(&self.fs, &dag_file, verbose)?;
        }
        Ok(())
    }
}
