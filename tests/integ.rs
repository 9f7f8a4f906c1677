use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use valdag::{App, Args};

const CONFIG: &str = r#"name: integ
LFS: $ROOT/lfs
alignments:
  ideal: {title: Ideal, globaltag: gt_ideal}
  prompt: {title: Prompt, globaltag: gt_prompt}
validations:
  DMR:
    single:
      mb: {IOV: [1, 2], alignments: [ideal, prompt]}
    merge:
      all: {singles: [mb]}
  GCP:
    cmp: {IOV: 1, reference: ideal, test: prompt}
  JetHT:
    single:
      jetht: {alignments: [ideal], dataset: $ROOT/files.txt, filesPerJob: 2}
    merge:
      jetht: {singles: [jetht], alignments: [ideal]}
    plot:
      jetht: {merges: [jetht], alignments: [ideal]}
"#;

/// Temp dir holding a config, its file list, and an empty release area.
fn setup(config: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    std::fs::write(root.join("files.txt"), "/store/a.root\n/store/b.root\n/store/c.root\n")?;
    std::fs::create_dir(root.join("cmssw"))?;
    let config = config.replace("$ROOT", root.to_str().unwrap());
    std::fs::write(root.join("integ.yaml"), config)?;
    Ok((dir, root))
}

fn basic_args(root: &Path) -> Args {
    Args {
        config: Some(root.join("integ.yaml").to_str().unwrap().to_owned()),
        dry: true,
        verbose: 1,
        example: false,
        force: false,
        no_clobber: false,
        output: Some(root.join("out").to_str().unwrap().to_owned()),
        cmssw_base: root.join("cmssw").to_str().unwrap().to_owned(),
        scram_arch: None,
    }
}

fn run(args: Args) -> Result<()> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    let settings = args.try_into()?;
    App::new(settings).run()
}

/// (name, dir) of every JOB record in a DAG file.
fn dag_jobs(dag: &str) -> Vec<(String, PathBuf)> {
    dag.lines()
        .filter_map(|line| line.strip_prefix("JOB "))
        .map(|rest| {
            let fields: Vec<_> = rest.split(' ').collect();
            (fields[0].to_owned(), PathBuf::from(fields[3]))
        })
        .collect()
}

#[test]
fn test_dry_run() -> Result<()> {
    let (_dir, root) = setup(CONFIG)?;
    run(basic_args(&root))?;

    let vd = root.join("out/integ");
    let dag = std::fs::read_to_string(vd.join("DAG/dagFile"))?;
    let jobs = dag_jobs(&dag);
    assert_eq!(jobs.len(), 4 + 2 + 1 + 3, "one record per job");
    assert_eq!(jobs[0].0, "DMR_single_ideal_mb_1");
    assert_eq!(jobs[0].1, vd.join("DMR/single/mb/ideal/1"));
    assert!(dag.contains("\nPARENT DMR_single_ideal_mb_1 DMR_single_prompt_mb_1 CHILD DMR_merge_all_1\n"));
    assert_eq!(dag.lines().filter(|line| line.starts_with("PARENT")).count(), 4);
    assert!(dag.contains("condor.sub DIR"));

    for (name, dir) in &jobs {
        for file in ["validation.json", "validation.yaml", "run.sh", "condor.sub"] {
            assert!(dir.join(file).is_file(), "{name} has {file}");
        }
    }

    let (_, jetht) = jobs.iter().find(|(name, _)| name.starts_with("JetHT_single")).unwrap();
    assert!(jetht.join("crabConfiguration.py").is_file());
    let sub = std::fs::read_to_string(jetht.join("condor.sub"))?;
    assert!(sub.ends_with("queue 2\n"));
    assert_eq!(
        std::fs::read_link(jetht.join("validation_cfg.py"))?.file_name(),
        Some(std::ffi::OsStr::new("JetHT_cfg.py"))
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(jobs[0].1.join("run.sh"))?.permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    assert!(root.join("lfs/integ/DMR/single/mb/ideal/1").is_dir(), "output dir created");
    assert!(!vd.join("DAG/submit.out").exists(), "nothing submitted");
    Ok(())
}

#[test]
fn test_rerun_is_identical() -> Result<()> {
    let (_dir, root) = setup(CONFIG)?;
    let vd = root.join("out/integ");

    let snapshot = || -> Result<Vec<String>> {
        let dag = std::fs::read_to_string(vd.join("DAG/dagFile"))?;
        let mut texts = vec![dag.clone()];
        for (_, dir) in dag_jobs(&dag) {
            texts.push(std::fs::read_to_string(dir.join("validation.json"))?);
            texts.push(std::fs::read_to_string(dir.join("run.sh"))?);
        }
        Ok(texts)
    };

    run(basic_args(&root))?;
    let first = snapshot()?;
    run(basic_args(&root))?;
    assert_eq!(first, snapshot()?);
    Ok(())
}

#[test]
fn test_no_clobber() -> Result<()> {
    let (_dir, root) = setup(CONFIG)?;
    run(basic_args(&root))?;

    let mut args = basic_args(&root);
    args.no_clobber = true;
    let err = run(args).unwrap_err();
    assert!(format!("{err:#}").contains("already exists"));
    Ok(())
}

#[test]
fn test_force_replaces() -> Result<()> {
    let (_dir, root) = setup(CONFIG)?;
    run(basic_args(&root))?;
    let stray = root.join("out/integ/GCP/single/cmp/1/stray.txt");
    std::fs::write(&stray, "left over")?;

    let mut args = basic_args(&root);
    args.force = true;
    run(args)?;
    assert!(!stray.exists());
    assert!(root.join("out/integ/GCP/single/cmp/1/validation.json").is_file());
    Ok(())
}

#[test]
fn test_bad_config_writes_nothing() -> Result<()> {
    let config = "name: integ\nLFS: $ROOT/lfs\nalignments: {}\nvalidations:\n  DMR:\n    merge:\n      m: {singles: [a]}\n";
    let (_dir, root) = setup(config)?;
    let err = run(basic_args(&root)).unwrap_err();
    assert!(format!("{err:#}").contains("No 'single' key word in config for DMR"));
    assert!(!root.join("out").exists());
    assert!(!root.join("lfs").exists());
    Ok(())
}

#[test]
fn test_example() -> Result<()> {
    let mut args = basic_args(Path::new("/nonexistent"));
    args.config = None;
    args.example = true;
    run(args)
}
