//! A single pool worker thread.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};

use insight_core::errors::PoolError;
use insight_core::traits::CancellationToken;

use crate::executor::task::{run_task, DetectorResult, DetectorTask};

/// A task handed to a worker.
pub(crate) struct Job {
    pub batch: u64,
    pub task_index: usize,
    pub task: DetectorTask,
    pub cancel: CancellationToken,
}

/// Messages from workers to the supervisor.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Finished {
        worker_id: u64,
        batch: u64,
        task_index: usize,
        result: DetectorResult,
    },
    /// The worker thread is ending. `panicked` when a detector panic unwound it.
    Exited { worker_id: u64, panicked: bool },
}

#[derive(Debug)]
pub(crate) struct Worker {
    id: u64,
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(id: u64, events: Sender<WorkerEvent>) -> Result<Self, PoolError> {
        let (jobs, rx) = bounded::<Job>(1);
        let handle = thread::Builder::new()
            .name(format!("insight-worker-{id}"))
            .spawn(move || {
                let _guard = ExitGuard {
                    worker_id: id,
                    events: events.clone(),
                };
                for job in rx.iter() {
                    let result = run_task(&job.task, job.cancel);
                    let event = WorkerEvent::Finished {
                        worker_id: id,
                        batch: job.batch,
                        task_index: job.task_index,
                        result,
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
            })
            .map_err(|source| PoolError::SpawnFailed {
                worker_id: id,
                source,
            })?;
        Ok(Self {
            id,
            jobs: Some(jobs),
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Hand over a job. Fails, returning the job, if the worker is gone or busy.
    pub fn dispatch(&self, job: Job) -> Result<(), Job> {
        match &self.jobs {
            Some(tx) => tx.try_send(job).map_err(|e| match e {
                TrySendError::Full(job) | TrySendError::Disconnected(job) => job,
            }),
            None => Err(job),
        }
    }

    /// Stop feeding the worker and detach it without waiting. A worker stuck
    /// in a detector exits whenever that detector returns.
    pub fn retire(mut self) {
        self.jobs.take();
        self.handle.take();
    }

    /// Stop feeding the worker and wait for it to exit.
    pub fn join(mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct ExitGuard {
    worker_id: u64,
    events: Sender<WorkerEvent>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let _ = self.events.send(WorkerEvent::Exited {
            worker_id: self.worker_id,
            panicked: thread::panicking(),
        });
    }
}
