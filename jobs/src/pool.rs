use util::{HashSet, IdVec};

use crate::{Error, Job};

/// Index of a job in a `JobPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(usize);

impl From<usize> for JobId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl From<JobId> for usize {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// All jobs of a run, across validation kinds, in expansion order.
#[derive(Debug, Default)]
pub struct JobPool {
    jobs: IdVec<JobId, Job>,
    names: HashSet<String>,
}

impl JobPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: IdVec::with_capacity(capacity),
            names: HashSet::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Add `job` to the pool. Its display name must not be taken yet.
    pub fn push(&mut self, job: Job) -> Result<JobId, Error> {
        if !self.names.insert(job.name.clone()) {
            return Err(Error::DuplicateJobName(job.name));
        }
        Ok(self.jobs.push(job))
    }

    pub fn extend(&mut self, jobs: impl IntoIterator<Item = Job>) -> Result<(), Error> {
        for job in jobs {
            self.push(job)?;
        }
        Ok(())
    }

    pub fn get(&self, id: JobId) -> &Job {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: JobId) -> &mut Job {
        self.jobs.get_mut(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = (JobId, &Job)> {
        self.jobs.iter_ids()
    }
}
