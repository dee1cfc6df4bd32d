//! Bounded process pool that drives one predictor invocation per job.
//!
//! A single coordinator owns the table of running invocations and the
//! submitted/completed counters. Each launched process gets a watcher thread
//! that drains both output pipes, waits for the exit, and hands the process
//! back over a completion channel. The coordinator blocks on that channel
//! instead of polling, reaps everything that has finished, then refills the
//! pool in job order.

use crate::command::PredictorCommand;
use crate::job::JobDescriptor;
use crate::report::{ResultRecord, parse_report};
use std::{
    io::{ErrorKind, Read, Write},
    process::{Child, Command, ExitStatus},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Instant,
};
use tracing::{debug, info, warn};

/// Stable identifier of a job: its index in the loaded job list.
pub type JobId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Pending,
    Running,
    Completed,
    Reaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Concatenated in the order invocations were observed complete.
    pub records: Vec<ResultRecord>,
    pub launched: usize,
    pub peak_running: usize,
}

/// Effective pool size for `total` jobs. Zero jobs means nothing is launched.
pub fn clamp_concurrency(requested: usize, total: usize) -> usize {
    requested.max(1).min(total)
}

struct Completion {
    job_id: JobId,
    child: Option<Child>,
    status: Option<ExitStatus>,
    stdout: String,
    stderr: String,
}

struct RunningInvocation<'a> {
    job: &'a JobDescriptor,
    started: Instant,
}

/// Slot table indexed by [`JobId`]; removal leaves the slot empty in place.
struct RunningTable<'a> {
    slots: Vec<Option<RunningInvocation<'a>>>,
    len: usize,
}

impl<'a> RunningTable<'a> {
    fn with_capacity(total: usize) -> Self {
        Self {
            slots: (0..total).map(|_| None).collect(),
            len: 0,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, job_id: JobId, invocation: RunningInvocation<'a>) {
        if self.slots[job_id].replace(invocation).is_none() {
            self.len += 1;
        }
    }

    fn remove(&mut self, job_id: JobId) -> Option<RunningInvocation<'a>> {
        let removed = self.slots.get_mut(job_id).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }
}

fn read_pipe<R: Read>(mut pipe: R, job_id: JobId) -> String {
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf) {
        warn!("job {job_id}: could not read predictor output: {e}");
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Drains both pipes (stderr on a helper thread so neither can fill up and
/// stall the child), waits for the exit and reports back.
fn watch(job_id: JobId, mut child: Child, completions: Sender<Completion>) {
    let stderr_reader = child
        .stderr
        .take()
        .map(|pipe| thread::spawn(move || read_pipe(pipe, job_id)));
    let stdout = child
        .stdout
        .take()
        .map(|pipe| read_pipe(pipe, job_id))
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    let status = match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("job {job_id}: could not wait for predictor: {e}");
            None
        }
    };
    let _ = completions.send(Completion {
        job_id,
        child: Some(child),
        status,
        stdout,
        stderr,
    });
}

fn complete_empty(job_id: JobId, completions: &Sender<Completion>) {
    let _ = completions.send(Completion {
        job_id,
        child: None,
        status: None,
        stdout: String::new(),
        stderr: String::new(),
    });
}

fn spawn_and_watch(
    job_id: JobId,
    mut command: Command,
    shown: String,
    completions: Sender<Completion>,
) {
    match command.spawn() {
        Ok(child) => {
            debug!("job {job_id}: started pid {}: {}", child.id(), shown);
            watch(job_id, child, completions);
        }
        Err(e) => {
            warn!("job {job_id}: could not start predictor '{}': {e}", shown);
            complete_empty(job_id, &completions);
        }
    }
}

/// Kills (if still alive) and waits on a finished invocation's process.
/// Killing an already-exited process is not an error.
fn release(job_id: JobId, child: Option<Child>, status: Option<ExitStatus>) {
    let Some(mut child) = child else {
        return;
    };
    match child.kill() {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::InvalidInput => {}
        Err(e) if status.is_some() => {
            debug!("job {job_id}: kill after exit reported: {e}");
        }
        Err(e) => warn!("job {job_id}: could not kill predictor process: {e}"),
    }
    if let Err(e) = child.wait() {
        warn!("job {job_id}: could not release predictor process: {e}");
    }
}

pub struct ProcessPool {
    command: PredictorCommand,
    concurrency: usize,
    diagnostics: Box<dyn Write + Send>,
}

impl ProcessPool {
    pub fn new(command: PredictorCommand, concurrency: usize) -> Self {
        Self {
            command,
            concurrency,
            diagnostics: Box::new(std::io::stderr()),
        }
    }

    /// Where forwarded predictor stderr goes. Defaults to this process's stderr.
    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Write + Send>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn launch<'a>(
        &self,
        job_id: JobId,
        job: &'a JobDescriptor,
        completions: &Sender<Completion>,
    ) -> RunningInvocation<'a> {
        let started = Instant::now();
        let command = self.command.build(job);
        let display = self.command.display_for(job);
        let sender = completions.clone();
        // The process is spawned on the watcher thread, so the child never
        // exists without an owner that waits for it.
        let watcher = thread::Builder::new()
            .name(format!("phdsnp-job-{job_id}"))
            .spawn(move || spawn_and_watch(job_id, command, display, sender));
        if let Err(e) = watcher {
            warn!("job {job_id}: could not start watcher thread, predictor not launched: {e}");
            complete_empty(job_id, completions);
        }
        RunningInvocation { job, started }
    }

    /// Runs every job exactly once with at most `min(concurrency, jobs.len())`
    /// predictor processes alive at a time. `on_progress` fires after each reap.
    ///
    /// Exit codes are not inspected: any invocation that finishes is reaped
    /// and whatever its output parses to is accepted.
    pub fn run<F>(&mut self, jobs: &[JobDescriptor], mut on_progress: F) -> BatchOutcome
    where
        F: FnMut(Progress),
    {
        let total = jobs.len();
        let limit = clamp_concurrency(self.concurrency, total);
        let mut outcome = BatchOutcome::default();
        if total == 0 {
            return outcome;
        }
        info!("running {total} jobs with {limit} concurrent predictor processes");

        let (sender, completions): (Sender<Completion>, Receiver<Completion>) = mpsc::channel();
        let mut running = RunningTable::with_capacity(total);
        let mut lifecycle = vec![InvocationState::Pending; total];
        let mut submitted = 0;
        let mut completed = 0;

        while completed < total {
            while running.len() < limit && submitted < total {
                let job_id = submitted;
                let invocation = self.launch(job_id, &jobs[job_id], &sender);
                running.insert(job_id, invocation);
                lifecycle[job_id] = InvocationState::Running;
                submitted += 1;
                outcome.launched += 1;
                outcome.peak_running = outcome.peak_running.max(running.len());
            }

            // Block for the first finisher, then sweep up everything else
            // already done before refilling the pool.
            let Ok(first) = completions.recv() else {
                break;
            };
            let mut finished = vec![first];
            finished.extend(completions.try_iter());

            for completion in finished {
                let job_id = completion.job_id;
                let Some(invocation) = running.remove(job_id) else {
                    warn!("job {job_id}: ignoring completion for an invocation not running");
                    continue;
                };
                lifecycle[job_id] = InvocationState::Completed;
                debug!(
                    "job {job_id} ({}) finished with {:?} after {:.2?}",
                    invocation.job,
                    completion.status,
                    invocation.started.elapsed()
                );

                let records = parse_report(
                    &completion.stdout,
                    &completion.stderr,
                    self.diagnostics.as_mut(),
                );
                if records.is_empty() {
                    debug!("job {job_id}: predictor output contained no result rows");
                }
                outcome.records.extend(records);
                release(job_id, completion.child, completion.status);

                lifecycle[job_id] = InvocationState::Reaped;
                completed += 1;
                on_progress(Progress { completed, total });
            }
        }

        debug_assert!(
            lifecycle
                .iter()
                .all(|state| *state == InvocationState::Reaped)
        );
        outcome
    }
}
