use crate::{JobId, JobPool};

/// Attach dependencies to every job that consumes earlier-stage jobs.
///
/// A job depends on every job of the same validation kind, from an earlier
/// stage, whose key matches its `Consumes` selector. Returns the number of
/// edges added.
pub fn link(pool: &mut JobPool) -> usize {
    let consumers: Vec<JobId> = pool
        .iter_ids()
        .filter(|(_, job)| job.consumes.is_some())
        .map(|(id, _)| id)
        .collect();

    let mut n_edges = 0;
    for id in consumers {
        let deps: Vec<String> = {
            let job = pool.get(id);
            let Some(consumes) = &job.consumes else {
                continue;
            };
            pool.iter()
                .filter(|other| other.key.stage < job.key.stage)
                .filter(|other| consumes.matches(job.key.kind, &other.key))
                .map(|other| other.name.clone())
                .collect()
        };

        let job = pool.get_mut(id);
        if deps.is_empty() {
            log::warn!("{} matched no jobs to depend on; check its inclusion list", job.name);
        } else {
            log::debug!("{} depends on {}", job.name, deps.join(", "));
        }
        n_edges += deps.len();
        job.dependencies.extend(deps);
    }
    n_edges
}
