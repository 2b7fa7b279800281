//! The pool supervisor.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use insight_core::constants::SUPERVISOR_POLL_INTERVAL_MS;
use insight_core::errors::PoolError;
use insight_core::events::types::{
    DetectorCrashedEvent, DetectorTimedOutEvent, WorkerReplacedEvent,
};
use insight_core::events::EventDispatcher;
use insight_core::tracing::metrics;
use insight_core::traits::{Cancellable, CancellationToken};

use super::config::WorkerPoolConfig;
use super::stats::PoolStats;
use super::worker::{Job, Worker, WorkerEvent};
use crate::executor::task::{DetectorResult, DetectorTask};

/// Cloneable handle that shuts the pool down from another thread.
///
/// Triggering it while a batch runs cancels in-flight tasks, drops queued
/// ones (both reported as cancelled), and retires every worker.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A task currently held by a worker.
#[derive(Debug)]
struct InFlight {
    task_index: usize,
    detector: String,
    file: String,
    timeout: Duration,
    started: Instant,
    deadline: Instant,
    cancel: CancellationToken,
}

#[derive(Debug)]
struct Slot {
    worker: Option<Worker>,
    in_flight: Option<InFlight>,
}

impl Slot {
    fn worker_id(&self) -> Option<u64> {
        self.worker.as_ref().map(Worker::id)
    }

    fn is_idle(&self) -> bool {
        self.worker.is_some() && self.in_flight.is_none()
    }
}

/// Fixed-size pool of detector workers.
///
/// At most `max_workers` tasks run at once. Every task handed to
/// [`run_batch`](Self::run_batch) yields exactly one result: completed,
/// crashed, timed out, or cancelled.
#[derive(Debug)]
pub struct WorkerPool {
    config: WorkerPoolConfig,
    slots: Vec<Slot>,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
    next_worker_id: u64,
    batch: u64,
    shutdown: ShutdownHandle,
    shut_down: bool,
    stats: PoolStats,
    dispatcher: EventDispatcher,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        Self::with_events(config, EventDispatcher::new())
    }

    /// Validate `config` and spawn `max_workers` workers.
    pub fn with_events(config: WorkerPoolConfig, dispatcher: EventDispatcher) -> Result<Self, PoolError> {
        config.validate()?;
        let (events_tx, events_rx) = unbounded();
        let mut pool = Self {
            slots: Vec::with_capacity(config.max_workers),
            config,
            events_tx,
            events_rx,
            next_worker_id: 0,
            batch: 0,
            shutdown: ShutdownHandle::default(),
            shut_down: false,
            stats: PoolStats::default(),
            dispatcher,
        };
        for _ in 0..pool.config.max_workers {
            let worker = pool.spawn_worker()?;
            pool.slots.push(Slot {
                worker: Some(worker),
                in_flight: None,
            });
        }
        info!(workers = pool.config.max_workers, "worker pool started");
        Ok(pool)
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down || self.shutdown.is_shutdown()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active_workers: self.slots.iter().filter(|s| s.worker.is_some()).count(),
            ..self.stats.clone()
        }
    }

    fn spawn_worker(&mut self) -> Result<Worker, PoolError> {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        let worker = Worker::spawn(id, self.events_tx.clone())?;
        self.stats.workers_spawned += 1;
        Ok(worker)
    }

    /// Retire the slot's worker and put a fresh one in its place.
    fn replace_worker(&mut self, slot: usize, reason: &str) {
        let Some(old) = self.slots[slot].worker.take() else {
            return;
        };
        let retired = old.id();
        old.retire();
        let new_worker = match self.spawn_worker() {
            Ok(w) => Some(w),
            Err(e) => {
                error!(error = %e, "failed to spawn replacement worker");
                None
            }
        };
        let new_id = new_worker.as_ref().map(Worker::id);
        self.slots[slot].worker = new_worker;
        self.stats.workers_replaced += 1;
        warn!(
            retired_worker = retired,
            new_worker = ?new_id,
            reason,
            { metrics::POOL_WORKERS_REPLACED } = self.stats.workers_replaced,
            "worker replaced"
        );
        self.dispatcher.emit_worker_replaced(&WorkerReplacedEvent {
            retired_worker: retired,
            new_worker: new_id,
            reason: reason.to_string(),
        });
    }

    /// Run a batch of tasks to completion. Results are returned in task order.
    pub fn run_batch(&mut self, tasks: Vec<DetectorTask>) -> Vec<DetectorResult> {
        let total = tasks.len();
        let meta: Vec<(String, String)> = tasks
            .iter()
            .map(|t| (t.detector_name().to_string(), t.file().to_string()))
            .collect();
        let mut results: Vec<Option<DetectorResult>> = (0..total).map(|_| None).collect();

        if self.is_shut_down() {
            debug!(tasks = total, "pool is shut down, cancelling batch");
            self.stats.tasks_cancelled += total as u64;
            return meta
                .iter()
                .map(|(d, f)| DetectorResult::cancelled(d, f, Duration::ZERO))
                .collect();
        }

        self.batch += 1;
        let batch = self.batch;
        let mut order: Vec<usize> = (0..total).collect();
        if self.config.priority_dispatch {
            order.sort_by(|a, b| tasks[*b].risk().cmp(&tasks[*a].risk()));
        }
        let mut slots_for_tasks: Vec<Option<DetectorTask>> = tasks.into_iter().map(Some).collect();
        let mut queue: VecDeque<(usize, DetectorTask)> = order
            .into_iter()
            .filter_map(|i| slots_for_tasks[i].take().map(|t| (i, t)))
            .collect();
        let mut pending = total;
        let poll = Duration::from_millis(SUPERVISOR_POLL_INTERVAL_MS);

        while pending > 0 {
            if self.shutdown.is_shutdown() {
                pending -= self.cancel_all(&mut queue, &mut results);
                break;
            }

            pending -= self.dispatch_idle(batch, &mut queue, &mut results);

            if self.slots.iter().all(|s| s.in_flight.is_none()) {
                if queue.is_empty() {
                    break;
                }
                if self.slots.iter().all(|s| s.worker.is_none()) {
                    for (i, _) in queue.drain(..) {
                        let (d, f) = &meta[i];
                        results[i] = Some(DetectorResult::crashed(d, f, "no workers available", Duration::ZERO));
                        self.stats.tasks_crashed += 1;
                        pending -= 1;
                    }
                    break;
                }
                continue;
            }

            let wait = self
                .nearest_deadline()
                .map(|d| d.saturating_duration_since(Instant::now()).min(poll))
                .unwrap_or(poll);
            match self.events_rx.recv_timeout(wait) {
                Ok(event) => pending -= self.handle_event(batch, event, &mut results),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            pending -= self.expire_deadlines(&mut results);
        }

        results
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                r.unwrap_or_else(|| {
                    let (d, f) = &meta[i];
                    self.stats.tasks_crashed += 1;
                    DetectorResult::crashed(d, f, "task produced no result", Duration::ZERO)
                })
            })
            .collect()
    }

    /// Hand queued tasks to idle workers. Returns how many tasks were
    /// resolved without running (dispatch failures).
    fn dispatch_idle(
        &mut self,
        batch: u64,
        queue: &mut VecDeque<(usize, DetectorTask)>,
        results: &mut [Option<DetectorResult>],
    ) -> usize {
        let mut resolved = 0;
        for slot in 0..self.slots.len() {
            if !self.slots[slot].is_idle() {
                continue;
            }
            let Some((task_index, task)) = queue.pop_front() else {
                break;
            };
            let cancel = CancellationToken::new();
            let in_flight = InFlight {
                task_index,
                detector: task.detector_name().to_string(),
                file: task.file().to_string(),
                timeout: task.timeout,
                started: Instant::now(),
                deadline: Instant::now() + task.timeout,
                cancel: cancel.clone(),
            };
            let job = Job {
                batch,
                task_index,
                task,
                cancel,
            };
            let sent = match self.slots[slot].worker.as_ref() {
                Some(worker) => worker.dispatch(job),
                None => Err(job),
            };
            match sent {
                Ok(()) => {
                    self.stats.tasks_dispatched += 1;
                    if self.config.verbose {
                        info!(
                            worker = ?self.slots[slot].worker_id(),
                            detector = %in_flight.detector,
                            file = %in_flight.file,
                            "task dispatched"
                        );
                    } else {
                        debug!(
                            worker = ?self.slots[slot].worker_id(),
                            detector = %in_flight.detector,
                            file = %in_flight.file,
                            "task dispatched"
                        );
                    }
                    self.slots[slot].in_flight = Some(in_flight);
                }
                Err(job) => {
                    // The worker is gone. Replace it and report the task as crashed.
                    let message = "worker unavailable at dispatch";
                    results[job.task_index] = Some(DetectorResult::crashed(
                        &in_flight.detector,
                        &in_flight.file,
                        message,
                        Duration::ZERO,
                    ));
                    self.stats.tasks_crashed += 1;
                    resolved += 1;
                    self.replace_worker(slot, message);
                }
            }
        }
        resolved
    }

    fn nearest_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter_map(|s| s.in_flight.as_ref().map(|f| f.deadline))
            .min()
    }

    fn slot_of(&self, worker_id: u64) -> Option<usize> {
        self.slots.iter().position(|s| s.worker_id() == Some(worker_id))
    }

    /// Apply one worker event. Returns the number of tasks it resolved.
    fn handle_event(
        &mut self,
        batch: u64,
        event: WorkerEvent,
        results: &mut [Option<DetectorResult>],
    ) -> usize {
        match event {
            WorkerEvent::Finished {
                worker_id,
                batch: event_batch,
                task_index,
                result,
            } => {
                let Some(slot) = self.slot_of(worker_id) else {
                    debug!(worker_id, "result from retired worker ignored");
                    return 0;
                };
                let matches = event_batch == batch
                    && self.slots[slot]
                        .in_flight
                        .as_ref()
                        .is_some_and(|f| f.task_index == task_index);
                if !matches {
                    debug!(worker_id, task_index, "stale result ignored");
                    return 0;
                }
                self.slots[slot].in_flight = None;
                if result.cancelled {
                    self.stats.tasks_cancelled += 1;
                } else if result.crashed {
                    self.stats.tasks_crashed += 1;
                    warn!(detector = %result.detector, file = %result.file, "detector failed");
                    self.dispatcher.emit_detector_crashed(&DetectorCrashedEvent {
                        detector: result.detector.clone(),
                        file: result.file.clone(),
                        message: result.errors.join("; "),
                    });
                } else {
                    self.stats.tasks_completed += 1;
                }
                if self.config.verbose {
                    info!(worker_id, detector = %result.detector, file = %result.file, "task finished");
                }
                results[task_index] = Some(result);
                1
            }
            WorkerEvent::Exited {
                worker_id,
                panicked,
            } => {
                let Some(slot) = self.slot_of(worker_id) else {
                    return 0;
                };
                let mut resolved = 0;
                if let Some(f) = self.slots[slot].in_flight.take() {
                    let message = if panicked {
                        "worker crashed: detector panicked".to_string()
                    } else {
                        "worker exited unexpectedly".to_string()
                    };
                    warn!(
                        worker_id,
                        detector = %f.detector,
                        file = %f.file,
                        { metrics::POOL_TASKS_CRASHED } = self.stats.tasks_crashed + 1,
                        "worker crashed during task"
                    );
                    self.dispatcher.emit_detector_crashed(&DetectorCrashedEvent {
                        detector: f.detector.clone(),
                        file: f.file.clone(),
                        message: message.clone(),
                    });
                    results[f.task_index] = Some(DetectorResult::crashed(
                        &f.detector,
                        &f.file,
                        message,
                        f.started.elapsed(),
                    ));
                    self.stats.tasks_crashed += 1;
                    resolved = 1;
                }
                self.replace_worker(slot, if panicked { "crash" } else { "exit" });
                resolved
            }
        }
    }

    /// Time out every in-flight task past its deadline.
    fn expire_deadlines(&mut self, results: &mut [Option<DetectorResult>]) -> usize {
        let now = Instant::now();
        let mut resolved = 0;
        for slot in 0..self.slots.len() {
            let expired = self.slots[slot]
                .in_flight
                .as_ref()
                .is_some_and(|f| f.deadline <= now);
            if !expired {
                continue;
            }
            let Some(f) = self.slots[slot].in_flight.take() else {
                continue;
            };
            f.cancel.cancel();
            let timeout_ms = f.timeout.as_millis() as u64;
            self.stats.tasks_timed_out += 1;
            warn!(
                detector = %f.detector,
                file = %f.file,
                timeout_ms,
                { metrics::POOL_TASKS_TIMED_OUT } = self.stats.tasks_timed_out,
                "detector timed out"
            );
            self.dispatcher.emit_detector_timed_out(&DetectorTimedOutEvent {
                detector: f.detector.clone(),
                file: f.file.clone(),
                timeout_ms,
            });
            results[f.task_index] = Some(DetectorResult::timed_out(
                &f.detector,
                &f.file,
                f.timeout,
                f.started.elapsed(),
            ));
            resolved += 1;
            self.replace_worker(slot, "timeout");
        }
        resolved
    }

    /// Cancel in-flight and queued work, then retire every worker.
    fn cancel_all(
        &mut self,
        queue: &mut VecDeque<(usize, DetectorTask)>,
        results: &mut [Option<DetectorResult>],
    ) -> usize {
        let mut resolved = 0;
        for slot in &mut self.slots {
            if let Some(f) = slot.in_flight.take() {
                f.cancel.cancel();
                // Busy workers are detached; only idle ones get joined below.
                if let Some(worker) = slot.worker.take() {
                    worker.retire();
                }
                results[f.task_index] = Some(DetectorResult::cancelled(
                    &f.detector,
                    &f.file,
                    f.started.elapsed(),
                ));
                resolved += 1;
            }
        }
        for (i, task) in queue.drain(..) {
            results[i] = Some(DetectorResult::cancelled(
                task.detector_name(),
                task.file(),
                Duration::ZERO,
            ));
            resolved += 1;
        }
        self.stats.tasks_cancelled += resolved as u64;
        info!(cancelled = resolved, "pool shutdown requested, batch cancelled");
        self.shutdown();
        resolved
    }

    /// Stop the pool. Idle workers are joined; busy ones have their task
    /// cancelled and are detached. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.shutdown.shutdown();
        let mut joined = 0;
        for slot in &mut self.slots {
            let busy = slot.in_flight.take();
            let Some(worker) = slot.worker.take() else {
                continue;
            };
            match busy {
                Some(f) => {
                    f.cancel.cancel();
                    worker.retire();
                }
                None => {
                    worker.join();
                    joined += 1;
                }
            }
        }
        info!(
            joined,
            { metrics::POOL_TASKS_DISPATCHED } = self.stats.tasks_dispatched,
            "worker pool shut down"
        );
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
