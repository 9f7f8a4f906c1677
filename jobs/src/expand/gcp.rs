use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;

use config::{GcpComparison, GlobalConfig, ValidationKind};

use super::{alignment_copies, check_component, check_iovs, validation_copy};
use crate::{ExpansionContext, Job, JobKey, LocalConfig, Stage};

const KIND: ValidationKind = ValidationKind::Gcp;
const EXE: &str = "GCP";

/// One geometry comparison job per comparison x IOV.
pub(super) fn expand(
    config: &GlobalConfig,
    ctx: &ExpansionContext,
    comparisons: &IndexMap<String, GcpComparison>,
) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for (comparison, block) in comparisons {
        let user = format!("'GCP.{comparison}'");
        check_component(comparison, &user)?;
        check_iovs(&block.iovs, &user)?;
        let alignments = alignment_copies(
            config,
            &[block.reference.clone(), block.test.clone()],
            &user,
        )?;

        for iov in &block.iovs {
            let iov_str = iov.to_string();
            let key = JobKey::new(KIND, Stage::Single).dataset(comparison).iov(iov);
            let parts = [comparison.as_str(), iov_str.as_str()];
            let dir = ctx.work_dir(KIND, Stage::Single, &parts);

            let mut local = LocalConfig::new(ctx.output_dir(KIND, Stage::Single, &parts));
            local.alignments = alignments.iter().cloned().collect();
            local.validation = Some(validation_copy(
                &block.rest,
                [
                    ("reference", Value::from(block.reference.as_str())),
                    ("test", Value::from(block.test.as_str())),
                    ("IOV", Value::from(iov)),
                ],
            ));

            jobs.push(Job::new(key, dir, EXE, local));
        }
    }
    Ok(jobs)
}
