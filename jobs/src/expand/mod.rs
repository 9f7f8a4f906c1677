use anyhow::{Context, Result};
use serde_json::{Map, Value};

use config::{is_valid_component, AlignmentSpec, GlobalConfig, Iov, Validation};

use crate::{ExpansionContext, Job, JobPool};

mod crab;
mod gcp;
mod iov_staged;
mod jetht;

/// Expand every validation in `config` into jobs, in document order.
///
/// Jobs come out unlinked; see `link`.
pub fn expand(config: &GlobalConfig, ctx: &ExpansionContext) -> Result<JobPool> {
    let validations = config.parse_validations()?;
    let mut pool = JobPool::with_capacity(validations.len() * 8);

    for validation in &validations {
        let kind = validation.kind();
        let jobs = match validation {
            Validation::Gcp(comparisons) => gcp::expand(config, ctx, comparisons),
            Validation::Dmr(stages) => iov_staged::expand(config, ctx, &iov_staged::DMR, stages),
            Validation::Pv(stages) => iov_staged::expand(config, ctx, &iov_staged::PV, stages),
            Validation::JetHt(stages) => jetht::expand(config, ctx, stages),
        }
        .with_context(|| format!("while expanding {kind} validation"))?;

        log::info!("{kind}: {} jobs", jobs.len());
        pool.extend(jobs)?;
    }
    Ok(pool)
}

/// Fail unless `name` can be used as a path and job name component.
fn check_component(name: &str, user: &str) -> Result<(), config::Error> {
    if is_valid_component(name) {
        Ok(())
    } else {
        Err(config::Error::InvalidName(name.to_owned(), user.to_owned()))
    }
}

fn check_iovs(iovs: &[Iov], user: &str) -> Result<(), config::Error> {
    for iov in iovs {
        check_component(&iov.to_string(), user)?;
    }
    Ok(())
}

/// Owned copies of the alignments named in `names`.
fn alignment_copies(
    config: &GlobalConfig,
    names: &[String],
    user: &str,
) -> Result<Vec<(String, AlignmentSpec)>, config::Error> {
    names
        .iter()
        .map(|name| Ok((name.clone(), config.alignment(name, user)?.clone())))
        .collect()
}

/// A fresh copy of a block's pass-through keys, with `extra` entries appended.
fn validation_copy<'a>(
    rest: &Map<String, Value>,
    extra: impl IntoIterator<Item = (&'a str, Value)>,
) -> Map<String, Value> {
    let mut copy = rest.clone();
    for (key, value) in extra {
        copy.insert(key.to_owned(), value);
    }
    copy
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect())
}
