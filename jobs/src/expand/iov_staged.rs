//! Validations split by interval of validity: single jobs per
//! dataset x IOV x alignment, merged per IOV.

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;

use config::{AlignmentSpec, GlobalConfig, Iov, IovSingle, MergeBlock, Stages, ValidationKind};

use super::{alignment_copies, check_component, check_iovs, string_list, validation_copy};
use crate::{Consumes, ExpansionContext, Job, JobKey, LocalConfig, Stage};

/// What differs between the interval-split validation kinds.
pub(super) struct IovKind {
    kind: ValidationKind,
    single_exe: &'static str,
    /// Templated framework script run by `single_exe`, if any.
    template: Option<&'static str>,
    merge_exe: &'static str,
    /// Single-stage keys whose string value gets "{}" replaced by the IOV.
    per_iov_keys: &'static [&'static str],
}

pub(super) const DMR: IovKind = IovKind {
    kind: ValidationKind::Dmr,
    single_exe: "DMRsingle",
    template: None,
    merge_exe: "DMRmerge",
    per_iov_keys: &[],
};

pub(super) const PV: IovKind = IovKind {
    kind: ValidationKind::Pv,
    single_exe: "cmsRun",
    template: Some("PV_cfg.py"),
    merge_exe: "PVmerge",
    per_iov_keys: &["goodlumi"],
};

pub(super) fn expand(
    config: &GlobalConfig,
    ctx: &ExpansionContext,
    spec: &IovKind,
    stages: &Stages<IovSingle>,
) -> Result<Vec<Job>> {
    let kind = spec.kind;
    let singles = stages.singles(kind)?;

    // every IOV seen in any single, first-seen order
    let mut iovs: Vec<&Iov> = Vec::new();
    let mut jobs = Vec::new();

    for (dataset, block) in singles {
        let user = format!("'{kind}.single.{dataset}'");
        check_component(dataset, &user)?;
        check_iovs(&block.iovs, &user)?;
        let alignments = alignment_copies(config, &block.alignments, &user)?;

        for iov in &block.iovs {
            if !iovs.contains(&iov) {
                iovs.push(iov);
            }
            for (alignment, alignment_spec) in &alignments {
                jobs.push(single_job(ctx, spec, dataset, block, iov, alignment, alignment_spec));
            }
        }
    }

    if let Some(merges) = &stages.merge {
        let mut merge_jobs = Vec::with_capacity(merges.len() * iovs.len());
        for (merge, block) in merges {
            let user = format!("'{kind}.merge.{merge}'");
            check_component(merge, &user)?;
            let alignments = if block.alignments.is_empty() {
                config.alignments.clone()
            } else {
                alignment_copies(config, &block.alignments, &user)?.into_iter().collect()
            };

            for iov in &iovs {
                merge_jobs.push(merge_job(ctx, spec, merge, block, iov, &alignments, &jobs));
            }
        }
        jobs.extend(merge_jobs);
    }

    if stages.plot.is_some() {
        log::warn!("{kind}: 'plot' stage is not supported, ignoring it");
    }

    Ok(jobs)
}

fn single_job(
    ctx: &ExpansionContext,
    spec: &IovKind,
    dataset: &str,
    block: &IovSingle,
    iov: &Iov,
    alignment: &str,
    alignment_spec: &AlignmentSpec,
) -> Job {
    let kind = spec.kind;
    let iov_str = iov.to_string();
    let parts = [dataset, alignment, iov_str.as_str()];

    let mut validation = validation_copy(&block.rest, [("IOV", Value::from(iov))]);
    for key in spec.per_iov_keys {
        if let Some(Value::String(val)) = validation.get_mut(*key) {
            *val = val.replace("{}", &iov_str);
        }
    }

    let mut local = LocalConfig::new(ctx.output_dir(kind, Stage::Single, &parts));
    local.alignment = Some(alignment_spec.clone());
    local.validation = Some(validation);

    let key = JobKey::new(kind, Stage::Single)
        .alignment(alignment)
        .dataset(dataset)
        .iov(iov);
    let job = Job::new(key, ctx.work_dir(kind, Stage::Single, &parts), spec.single_exe, local);
    match spec.template {
        Some(template) => job.with_template(ctx.template(template)),
        None => job,
    }
}

/// A merge job for one IOV. Each alignment that has a matching single job
/// gets that job's output attached as its `file`.
fn merge_job(
    ctx: &ExpansionContext,
    spec: &IovKind,
    merge: &str,
    block: &MergeBlock,
    iov: &Iov,
    alignments: &IndexMap<String, AlignmentSpec>,
    singles: &[Job],
) -> Job {
    let kind = spec.kind;
    let iov_str = iov.to_string();
    let parts = [merge, iov_str.as_str()];

    let mut consumes = Consumes::new(Stage::Single, &block.singles);
    consumes.iov = Some(iov.clone());
    // only the alignments this merge records outputs for:
    consumes.alignments = block.alignments.clone();

    let mut local = LocalConfig::new(ctx.output_dir(kind, Stage::Merge, &parts));
    local.alignments = alignments.clone();
    for single in singles.iter().filter(|job| consumes.matches(kind, &job.key)) {
        let target = single
            .key
            .alignment
            .as_ref()
            .and_then(|name| local.alignments.get_mut(name));
        if let Some(alignment) = target {
            alignment
                .extra
                .insert("file".to_owned(), Value::from(single.config.output.as_str()));
        }
    }
    local.validation = Some(validation_copy(
        &block.rest,
        [
            ("singles", string_list(&block.singles)),
            ("IOV", Value::from(iov)),
        ],
    ));

    let key = JobKey::new(kind, Stage::Merge).dataset(merge).iov(iov);
    Job::new(key, ctx.work_dir(kind, Stage::Merge, &parts), spec.merge_exe, local)
        .consuming(consumes)
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;
    use serde_json::json;

    fn stages(config: &GlobalConfig, kind: &str) -> Result<Stages<IovSingle>> {
        Ok(serde_json::from_value(config.validations[kind].clone())?)
    }

    #[test]
    fn test_cartesian_singles() -> Result<()> {
        let config = config_with(json!({ "DMR": { "single": {
            "cosmics": { "IOV": [1, 2, 3], "alignments": ["ideal", "prompt"] },
            "collisions": { "IOV": "2018A", "alignments": ["prompt"] },
        }}}))?;
        let jobs = expand(&config, &context(&config), &DMR, &stages(&config, "DMR")?)?;
        assert_eq!(jobs.len(), 3 * 2 + 1);
        assert_eq!(
            names(&jobs)[..3],
            ["DMR_single_ideal_cosmics_1", "DMR_single_prompt_cosmics_1", "DMR_single_ideal_cosmics_2"]
        );
        assert_eq!(names(&jobs)[6], "DMR_single_prompt_collisions_2018A");

        let job = &jobs[1];
        assert_eq!(job.exe, "DMRsingle");
        assert!(job.template.is_none());
        assert_eq!(job.dir.to_str(), Some("/vd/run/DMR/single/cosmics/prompt/1"));
        assert_eq!(
            job.config.output,
            "/eos/cms/store/group/lfs/run/DMR/single/cosmics/prompt/1"
        );
        assert_eq!(job.config.alignment.as_ref().map(|a| a.title.as_str()), Some("Prompt"));
        let validation = job.config.validation.clone().map(Value::Object);
        assert_eq!(validation, Some(json!({ "IOV": 1 })));
        Ok(())
    }

    #[test]
    fn test_pv_single() -> Result<()> {
        let config = config_with(json!({ "PV": { "single": {
            "minbias": { "IOV": [315257], "alignments": ["ideal"], "goodlumi": "/lumi/{}.json" },
        }}}))?;
        let jobs = expand(&config, &context(&config), &PV, &stages(&config, "PV")?)?;
        let job = &jobs[0];
        assert_eq!(job.exe, "cmsRun");
        assert_eq!(
            job.template.as_deref().and_then(|t| t.file_name()),
            Some(std::ffi::OsStr::new("PV_cfg.py"))
        );
        let validation = job.config.validation.as_ref().map(|v| &v["goodlumi"]);
        assert_eq!(validation, Some(&json!("/lumi/315257.json")));
        Ok(())
    }

    #[test]
    fn test_merge_per_iov() -> Result<()> {
        let config = config_with(json!({ "PV": {
            "single": {
                "a": { "IOV": [1, 2], "alignments": ["ideal", "prompt"] },
                "b": { "IOV": [3], "alignments": ["ideal"] },
            },
            "merge": { "m": { "singles": ["a"], "methods": ["median"] } },
        }}))?;
        let jobs = expand(&config, &context(&config), &PV, &stages(&config, "PV")?)?;
        let merges: Vec<_> = jobs.iter().filter(|job| job.key.stage == Stage::Merge).collect();
        let merge_names: Vec<_> = merges.iter().map(|job| job.name.as_str()).collect();
        assert_eq!(merge_names, vec!["PV_merge_m_1", "PV_merge_m_2", "PV_merge_m_3"]);

        let merge = merges[1];
        assert_eq!(merge.exe, "PVmerge");
        assert_eq!(merge.dir.to_str(), Some("/vd/run/PV/merge/m/2"));
        assert_eq!(merge.config.output, "/eos/cms/store/group/lfs/run/PV/merge/m/2");
        assert_eq!(
            merge.config.alignments["prompt"].extra["file"],
            "/eos/cms/store/group/lfs/run/PV/single/a/prompt/2"
        );
        assert_eq!(
            merge.config.alignments["ideal"].extra["file"],
            "/eos/cms/store/group/lfs/run/PV/single/a/ideal/2"
        );
        let consumes = merge.consumes.as_ref().map(|c| (c.stage, c.iov.clone()));
        assert_eq!(consumes, Some((Stage::Single, Some(Iov::Run(2)))));

        // no "a" single for IOV 3
        assert!(merges[2].config.alignments["ideal"].extra.get("file").is_none());

        // the global alignments are untouched
        assert!(config.alignments["ideal"].extra.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_iov() -> Result<()> {
        let config = config_with(json!({ "DMR": { "single": {
            "d": { "IOV": ["run 1"], "alignments": ["ideal"] },
        }}}))?;
        let err = expand(&config, &context(&config), &DMR, &stages(&config, "DMR")?).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<config::Error>(),
            Some(config::Error::InvalidName(name, _)) if name == "run 1"
        ));
        Ok(())
    }
}
