use nix::{
    errno::Errno,
    sys::wait::{WaitPidFlag, WaitStatus, waitpid},
    unistd::Pid,
};
use tracing::{info, warn};

use crate::{command::Command, error::ShellError, signal::DeferChildSignals};

const INITIAL_CAPACITY: usize = 10;

/// A command running in the background.
#[derive(Debug)]
pub struct Job {
    pub pid: Pid,
    pub command: Command,
}

/// Background jobs in the order they were started.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Grows the backing storage by half when it is full.
    fn reserve_slot(&mut self) {
        let capacity = self.jobs.capacity();
        if self.jobs.len() >= capacity {
            let grown = (capacity + capacity / 2).max(INITIAL_CAPACITY);
            self.jobs.reserve_exact(grown - self.jobs.len());
        }
    }

    /// Records a started background process and returns its job number.
    pub fn add(&mut self, command: Command, pid: Pid) -> Result<usize, ShellError> {
        if pid.as_raw() <= 0 {
            return Err(ShellError::InvalidPid(pid.as_raw()));
        }
        let _defer = DeferChildSignals::new();
        self.reserve_slot();
        info!(pid = pid.as_raw(), command = %command, "job started");
        self.jobs.push(Job { pid, command });
        Ok(self.jobs.len())
    }

    /// Looks a job up by process id, returning its 1-based position.
    pub fn find_by_pid(&self, pid: Pid) -> Option<(usize, &Job)> {
        self.jobs
            .iter()
            .enumerate()
            .find(|(_, job)| job.pid == pid)
            .map(|(index, job)| (index + 1, job))
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Job> {
        let _defer = DeferChildSignals::new();
        let index = self.jobs.iter().position(|job| job.pid == pid)?;
        Some(self.jobs.remove(index))
    }

    /// Removes and returns every job whose process has terminated, without
    /// blocking. Each job comes with the number it had before the call.
    pub fn reap(&mut self) -> Vec<(usize, Job)> {
        let _defer = DeferChildSignals::new();
        let mut finished = Vec::new();
        let mut index = 0;
        while index < self.jobs.len() {
            let pid = self.jobs[index].pid;
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) | Err(Errno::ECHILD) => {
                    let number = index + finished.len() + 1;
                    let job = self.jobs.remove(index);
                    info!(number, pid = pid.as_raw(), command = %job.command, "job finished");
                    finished.push((number, job));
                }
                Ok(_) => index += 1,
                Err(e) => {
                    warn!(pid = pid.as_raw(), error = %e, "could not poll job");
                    index += 1;
                }
            }
        }
        finished
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.jobs.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}
