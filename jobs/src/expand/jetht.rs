use anyhow::Result;
use serde_json::{Map, Value};

use config::{AlignmentSpec, GlobalConfig, JetHtSingle, MergeBlock, PlotBlock, Stages, ValidationKind};

use super::crab::CrabRequest;
use super::{alignment_copies, check_component, string_list, validation_copy};
use crate::{
    Consumes, Error, ExpansionContext, FileListUnits, InputSource, Job, JobKey, LocalConfig, Stage,
    DEFAULT_FILES_PER_JOB,
};

const KIND: ValidationKind = ValidationKind::JetHt;
const SINGLE_TEMPLATE: &str = "JetHT_cfg.py";
const MERGE_EXE: &str = "addHistograms.sh";
const PLOT_EXE: &str = "jetHtPlotter";
const MERGED_NAME: &str = "JetHTAnalysis_merged";
const QUICK_FLAVOUR: &str = "espresso";
const DEFAULT_LUMI_FILE: &str = "lumiPerRun_Run2.txt";
const CRAB_FILE: &str = "crabConfiguration.py";

const EOS_PREFIX: &str = "/eos/cms";
const EOS_REDIRECTOR: &str = "root://eoscms.cern.ch/";

pub(super) fn expand(
    config: &GlobalConfig,
    ctx: &ExpansionContext,
    stages: &Stages<JetHtSingle>,
) -> Result<Vec<Job>> {
    let singles = stages.singles(KIND)?;
    let mut jobs = Vec::new();

    for (dataset, block) in singles {
        let user = format!("'{KIND}.single.{dataset}'");
        check_component(dataset, &user)?;
        for (alignment, spec) in alignment_copies(config, &block.alignments, &user)? {
            jobs.push(single_job(ctx, dataset, block, &alignment, spec)?);
        }
    }

    if let Some(merges) = &stages.merge {
        for (merge, block) in merges {
            let user = format!("'{KIND}.merge.{merge}'");
            check_component(merge, &user)?;
            if block.alignments.is_empty() {
                log::warn!("{user} lists no alignments, no merge jobs created");
            }
            for (alignment, _) in alignment_copies(config, &block.alignments, &user)? {
                jobs.push(merge_job(ctx, merge, block, &alignment));
            }
        }
    }

    if let Some(plots) = &stages.plot {
        for (plot, block) in plots {
            let user = format!("'{KIND}.plot.{plot}'");
            check_component(plot, &user)?;
            let single = singles.get(plot.as_str());
            jobs.push(plot_job(config, ctx, plot, block, single, &user)?);
        }
    }

    Ok(jobs)
}

/// One single job per dataset x alignment, split into batch jobs by input units.
fn single_job(
    ctx: &ExpansionContext,
    dataset: &str,
    block: &JetHtSingle,
    alignment: &str,
    spec: AlignmentSpec,
) -> Result<Job> {
    let input = block
        .dataset
        .as_deref()
        .ok_or_else(|| Error::MissingDataset(KIND.to_string(), dataset.to_owned()))?;
    let files_per_job = block.files_per_job.unwrap_or(DEFAULT_FILES_PER_JOB);
    if files_per_job == 0 {
        return Err(Error::ZeroFilesPerJob(KIND.to_string(), dataset.to_owned()).into());
    }

    let parts = [dataset, alignment];
    let mut local = LocalConfig::new(ctx.output_dir(KIND, Stage::Single, &parts));
    local.alignment = Some(spec);

    let mut validation = validation_copy(&block.rest, [("dataset", Value::from(input))]);
    if let Some(n) = block.files_per_job {
        validation.insert("filesPerJob".to_owned(), Value::from(n));
    }
    local.validation = Some(validation);

    let source = InputSource::classify(input);
    let n_jobs = match source {
        InputSource::Dataset(_) => 1,
        InputSource::FileList(path) => {
            let units = FileListUnits::read(path)?;
            let runs = units.runs();
            if !runs.is_empty() {
                local.extra.insert(
                    "runsInFiles".to_owned(),
                    runs.into_iter().map(Value::from).collect(),
                );
            }
            units.job_count(files_per_job)
        }
    };
    log::debug!("{KIND} single {dataset}/{alignment}: {source:?}, {n_jobs} batch jobs");

    let crab = CrabRequest {
        dataset,
        alignment,
        input: source,
        files_per_job,
        user: &ctx.user,
        date: &ctx.date,
    }
    .lines();
    let mut crab_file = crab.join("\n");
    crab_file.push('\n');
    local.extra.insert(
        "crabConfigurationFile".to_owned(),
        crab.into_iter().map(Value::from).collect(),
    );

    let key = JobKey::new(KIND, Stage::Single).alignment(alignment).dataset(dataset);
    Ok(
        Job::new(key, ctx.work_dir(KIND, Stage::Single, &parts), "cmsRun", local)
            .with_template(ctx.template(SINGLE_TEMPLATE))
            .with_arguments("validation_cfg.py config=validation.json jobNumber=$JOBNUMBER".to_owned())
            .with_n_jobs(n_jobs)
            .with_staged_file(CRAB_FILE, crab_file),
    )
}

/// Adds up the histograms of one alignment's single jobs.
fn merge_job(ctx: &ExpansionContext, merge: &str, block: &MergeBlock, alignment: &str) -> Job {
    let parts = [merge, alignment];
    let input_dir = ctx.output_dir(KIND, Stage::Single, &parts);
    let output_dir = ctx.output_dir(KIND, Stage::Merge, &parts);

    let eos_input = strip_eos(&input_dir);
    let eos_output = strip_eos(&output_dir);
    let local_run = !eos_input.starts_with("/store");

    let mut consumes = Consumes::new(Stage::Single, &block.singles);
    consumes.alignments = vec![alignment.to_owned()];

    let mut local = LocalConfig::new(output_dir.clone());
    local.validation = Some(validation_copy(
        &block.rest,
        [("singles", string_list(&block.singles))],
    ));

    let key = JobKey::new(KIND, Stage::Merge).alignment(alignment).dataset(merge);
    Job::new(key, ctx.work_dir(KIND, Stage::Merge, &parts), MERGE_EXE, local)
        .with_arguments(format!("{local_run} {eos_input} {eos_output} {MERGED_NAME}"))
        .with_flavour(QUICK_FLAVOUR)
        .consuming(consumes)
}

/// Draws every listed alignment's merged histograms into one set of plots.
fn plot_job(
    config: &GlobalConfig,
    ctx: &ExpansionContext,
    plot: &str,
    block: &PlotBlock,
    single: Option<&JetHtSingle>,
    user: &str,
) -> Result<Job> {
    let mut jethtplot = match block.rest.get("jethtplot") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(Error::NotAMapping("jethtplot".to_owned(), user.to_owned()).into()),
    };

    if let Some(borders) = single.and_then(|single| single.rest.get("profilePtBorders")) {
        jethtplot.insert("widePtBinBorders".to_owned(), borders.clone());
    }

    let mut alignments = Map::new();
    for (alignment, spec) in alignment_copies(config, &block.alignments, user)? {
        let merged = format!(
            "{}/{MERGED_NAME}.root",
            ctx.output_dir(KIND, Stage::Merge, &[plot, alignment.as_str()])
        );
        let mut input_file = strip_eos(&merged).to_owned();
        if input_file.starts_with("/store") {
            input_file.insert_str(0, EOS_REDIRECTOR);
        }

        let legend = spec.title.clone();
        let entry = spec
            .with_extra("inputFile", input_file)
            .with_extra("legendText", legend);
        alignments.insert(alignment, serde_json::to_value(entry)?);
    }
    jethtplot.insert("alignments".to_owned(), Value::Object(alignments));

    if !jethtplot.contains_key("lumiPerIovFile") {
        let lumi = ctx.data_file(DEFAULT_LUMI_FILE);
        jethtplot.insert(
            "lumiPerIovFile".to_owned(),
            Value::from(lumi.to_string_lossy().as_ref()),
        );
    }

    let mut local = LocalConfig::new(ctx.output_dir(KIND, Stage::Plot, &[plot]));
    local.extra.insert("jethtplot".to_owned(), Value::Object(jethtplot));

    let key = JobKey::new(KIND, Stage::Plot).dataset(plot);
    Ok(
        Job::new(key, ctx.work_dir(KIND, Stage::Plot, &[plot]), PLOT_EXE, local)
            .with_flavour(QUICK_FLAVOUR)
            .consuming(Consumes::new(Stage::Merge, &block.merges)),
    )
}

/// EOS paths are addressed relative to the instance root.
fn strip_eos(path: &str) -> &str {
    path.strip_prefix(EOS_PREFIX).unwrap_or(path)
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const DATASET: &str = "/JetHT/Run2018A-TkAlMinBias-12Nov2019_UL2018-v2/ALCARECO";

    fn stages(config: &GlobalConfig) -> Result<Stages<JetHtSingle>> {
        Ok(serde_json::from_value(config.validations["JetHT"].clone())?)
    }

    #[test]
    fn test_dataset_pipeline() -> Result<()> {
        let config = config_with(json!({ "JetHT": {
            "single": { "jetht": {
                "alignments": ["ideal", "prompt"],
                "dataset": DATASET,
                "profilePtBorders": [3, 5, 10],
            }},
            "merge": { "jetht": { "singles": ["jetht"], "alignments": ["ideal", "prompt"] } },
            "plot": { "jetht": {
                "merges": ["jetht"],
                "alignments": ["ideal"],
                "jethtplot": { "drawProfiles": true },
            }},
        }}))?;
        let jobs = expand(&config, &context(&config), &stages(&config)?)?;
        assert_eq!(
            names(&jobs),
            vec![
                "JetHT_single_ideal_jetht",
                "JetHT_single_prompt_jetht",
                "JetHT_merge_ideal_jetht",
                "JetHT_merge_prompt_jetht",
                "JetHT_plot_jetht",
            ]
        );

        let single = &jobs[0];
        assert_eq!(single.n_jobs, 1);
        assert_eq!(single.exe, "cmsRun");
        assert!(single.arguments.as_deref().is_some_and(|a| a.contains("jobNumber=")));
        assert!(single.config.extra.contains_key("crabConfigurationFile"));
        assert!(!single.config.extra.contains_key("runsInFiles"));
        assert_eq!(single.staged_files[0].name, "crabConfiguration.py");
        assert!(single.staged_files[0].contents.contains(DATASET));

        let merge = &jobs[2];
        assert_eq!(merge.exe, "addHistograms.sh");
        assert_eq!(merge.flavour.as_deref(), Some("espresso"));
        assert_eq!(
            merge.arguments.as_deref(),
            Some(
                "false /store/group/lfs/run/JetHT/single/jetht/ideal \
                 /store/group/lfs/run/JetHT/merge/jetht/ideal JetHTAnalysis_merged"
            )
        );
        assert_eq!(
            merge.consumes.as_ref().and_then(|c| c.alignment.as_deref()),
            Some("ideal")
        );

        let plot = &jobs[4];
        let jethtplot = &plot.config.extra["jethtplot"];
        assert_eq!(jethtplot["drawProfiles"], true);
        assert_eq!(jethtplot["widePtBinBorders"], json!([3, 5, 10]));
        assert_eq!(
            jethtplot["alignments"]["ideal"]["inputFile"],
            "root://eoscms.cern.ch//store/group/lfs/run/JetHT/merge/jetht/ideal/JetHTAnalysis_merged.root"
        );
        assert_eq!(jethtplot["alignments"]["ideal"]["legendText"], "Ideal");
        assert_eq!(
            jethtplot["lumiPerIovFile"],
            "/cmssw/src/Alignment/OfflineValidation/data/lumiPerRun_Run2.txt"
        );
        Ok(())
    }

    #[test]
    fn test_run_annotated_file_list() -> Result<()> {
        let mut list = tempfile::NamedTempFile::new()?;
        writeln!(list, "55 a.root\n55 b.root\n56 c.root")?;
        let path = list.path().to_string_lossy().into_owned();

        let config = config_with(json!({ "JetHT": { "single": {
            "runs": { "alignments": ["ideal"], "dataset": path, "filesPerJob": 1 },
        }}}))?;
        let jobs = expand(&config, &context(&config), &stages(&config)?)?;
        let job = &jobs[0];
        assert_eq!(job.n_jobs, 2);
        assert_eq!(job.config.extra["runsInFiles"], json!(["55", "56"]));
        let validation = job.config.validation.as_ref().map(|v| v["filesPerJob"].clone());
        assert_eq!(validation, Some(json!(1)));
        Ok(())
    }

    #[test]
    fn test_file_list_split() -> Result<()> {
        let mut list = tempfile::NamedTempFile::new()?;
        for i in 0..12 {
            writeln!(list, "/store/f{i}.root")?;
        }
        let path = list.path().to_string_lossy().into_owned();

        let config = config_with(json!({ "JetHT": { "single": {
            "files": { "alignments": ["ideal"], "dataset": path },
        }}}))?;
        let jobs = expand(&config, &context(&config), &stages(&config)?)?;
        assert_eq!(jobs[0].n_jobs, 3);
        assert!(jobs[0].staged_files[0].contents.contains("inputList = '"));
        Ok(())
    }

    #[test]
    fn test_missing_dataset() -> Result<()> {
        let config = config_with(json!({ "JetHT": { "single": {
            "nodata": { "alignments": ["ideal"] },
        }}}))?;
        let err = expand(&config, &context(&config), &stages(&config)?).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingDataset(_, name)) if name == "nodata"));
        Ok(())
    }
}
