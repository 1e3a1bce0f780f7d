//! Concurrent task runner with a live status list.
//!
//! Async tasks run first on a bounded worker pool; sync tasks then run one by one in the order
//! they were added. A background ticker redraws the list so running rows show elapsed time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::error::{Result, UxError};
use crate::render::{visual, Canvas, Printer, Visual};
use crate::runtime::Ticker;
use crate::widgets::{CanvasOptions, CanvasSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Pending,
    Running,
    Skipped,
    Warning,
    Error,
    Success,
}

/// Failure reported by a task action. `state` decides how the row is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskError {
    pub state: TaskState,
    pub message: String,
}

impl TaskError {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub title: String,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Every failure of one [`TaskList::run`], in the order the tasks were added.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_failures(.failures))]
pub struct TaskListError {
    pub failures: Vec<TaskFailure>,
}

fn join_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub type TaskAction =
    Box<dyn FnOnce(&Progress) -> std::result::Result<TaskState, TaskError> + Send>;

pub struct TaskOptions {
    pub title: String,
    pub action: TaskAction,
    /// Run on the worker pool instead of in sequence.
    pub run_async: bool,
}

impl TaskOptions {
    pub fn new<F>(title: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&Progress) -> std::result::Result<TaskState, TaskError> + Send + 'static,
    {
        Self {
            title: title.into(),
            action: Box::new(action),
            run_async: false,
        }
    }

    pub fn run_async(mut self) -> Self {
        self.run_async = true;
        self
    }
}

pub struct TaskListOptions {
    /// Keep running sync tasks after a failure instead of skipping them.
    pub continue_on_error: bool,
    /// Worker threads for async tasks. Default: 5.
    pub max_concurrent_async: usize,
    /// Default: 1s.
    pub redraw_interval: Duration,
    /// Row prefixes per task state, styled with the state's color. Defaults: `(✔) Done`,
    /// `(x) Error`, `(!) Warning`, `(-) Running`, `(-) Skipped`, `(o) Pending`.
    pub success_prefix: String,
    pub error_prefix: String,
    pub warning_prefix: String,
    pub running_prefix: String,
    pub skipped_prefix: String,
    pub pending_prefix: String,
    pub canvas: CanvasOptions,
}

impl Default for TaskListOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            max_concurrent_async: 5,
            redraw_interval: Duration::from_secs(1),
            success_prefix: "(✔) Done".into(),
            error_prefix: "(x) Error".into(),
            warning_prefix: "(!) Warning".into(),
            running_prefix: "(-) Running".into(),
            skipped_prefix: "(-) Skipped".into(),
            pending_prefix: "(o) Pending".into(),
            canvas: CanvasOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct Prefixes {
    success: String,
    error: String,
    warning: String,
    running: String,
    skipped: String,
    pending: String,
}

impl From<&TaskListOptions> for Prefixes {
    fn from(options: &TaskListOptions) -> Self {
        Self {
            success: options.success_prefix.clone(),
            error: options.error_prefix.clone(),
            warning: options.warning_prefix.clone(),
            running: options.running_prefix.clone(),
            skipped: options.skipped_prefix.clone(),
            pending: options.pending_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TaskRecord {
    title: String,
    state: TaskState,
    error: Option<String>,
    progress: String,
    started: Option<Instant>,
    ended: Option<Instant>,
}

type Records = Arc<Mutex<Vec<TaskRecord>>>;

fn lock_records(records: &Mutex<Vec<TaskRecord>>) -> MutexGuard<'_, Vec<TaskRecord>> {
    records.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle a running action uses to report progress on its row.
#[derive(Clone)]
pub struct Progress {
    records: Records,
    index: usize,
}

impl Progress {
    /// Shown next to the title while the task runs, e.g. `Deploy (3/5 services)`.
    pub fn set(&self, text: impl Into<String>) {
        if let Some(record) = lock_records(&self.records).get_mut(self.index) {
            record.progress = text.into();
        }
    }
}

pub struct TaskList {
    records: Records,
    actions: Vec<(usize, bool, TaskAction)>,
    continue_on_error: bool,
    max_concurrent_async: usize,
    redraw_interval: Duration,
    prefixes: Arc<Prefixes>,
    slot: CanvasSlot,
}

impl TaskList {
    pub fn new(options: TaskListOptions) -> Self {
        let prefixes = Arc::new(Prefixes::from(&options));
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            actions: Vec::new(),
            continue_on_error: options.continue_on_error,
            max_concurrent_async: options.max_concurrent_async.max(1),
            redraw_interval: options.redraw_interval,
            prefixes,
            slot: CanvasSlot::Owned(options.canvas),
        }
    }

    pub fn with_canvas(mut self, canvas: &Canvas) -> Self {
        canvas.add_visual(self.visual());
        self.slot = CanvasSlot::Shared(canvas.clone());
        self
    }

    pub fn visual(&self) -> Box<dyn Visual> {
        task_list_visual(Arc::clone(&self.records), Arc::clone(&self.prefixes))
    }

    pub fn add_task(&mut self, task: TaskOptions) -> &mut Self {
        let index = {
            let mut records = lock_records(&self.records);
            records.push(TaskRecord {
                title: task.title,
                ..TaskRecord::default()
            });
            records.len() - 1
        };
        self.actions.push((index, task.run_async, task.action));
        self
    }

    /// Current state of every task, in the order they were added.
    pub fn states(&self) -> Vec<TaskState> {
        lock_records(&self.records)
            .iter()
            .map(|record| record.state)
            .collect()
    }

    /// Runs every task added since the last run and returns their failures, if any.
    pub fn run(&mut self) -> Result<()> {
        let records = Arc::clone(&self.records);
        let prefixes = Arc::clone(&self.prefixes);
        let (canvas, owned) = self
            .slot
            .resolve(|| task_list_visual(Arc::clone(&records), prefixes));
        canvas.run()?;

        let actions = std::mem::take(&mut self.actions);
        let total = actions.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let mut ticker = {
            let canvas = canvas.clone();
            let completed = Arc::clone(&completed);
            Ticker::spawn("task-list-redraw", self.redraw_interval, move || {
                if completed.load(Ordering::SeqCst) >= total {
                    return false;
                }
                if let Err(err) = canvas.update() {
                    tracing::warn!(error = %err, "failed to update task list");
                    return false;
                }
                true
            })
            .map_err(UxError::Io)?
        };

        let (async_tasks, sync_tasks): (Vec<_>, Vec<_>) =
            actions.into_iter().partition(|(_, run_async, _)| *run_async);
        tracing::debug!(
            async_tasks = async_tasks.len(),
            sync_tasks = sync_tasks.len(),
            "task list started"
        );

        run_pool(&records, &completed, async_tasks, self.max_concurrent_async);
        for (index, _, action) in sync_tasks {
            if !self.continue_on_error && has_failures(&records) {
                lock_records(&records)[index].state = TaskState::Skipped;
                completed.fetch_add(1, Ordering::SeqCst);
                continue;
            }
            execute(&records, index, action);
            completed.fetch_add(1, Ordering::SeqCst);
        }

        ticker.stop();
        let drawn = canvas.update();
        if owned {
            canvas.close();
        }
        drawn?;

        let failures: Vec<TaskFailure> = lock_records(&records)
            .iter()
            .filter_map(|record| {
                record.error.as_ref().map(|message| TaskFailure {
                    title: record.title.clone(),
                    message: message.clone(),
                })
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(UxError::Tasks(TaskListError { failures }))
        }
    }
}

fn has_failures(records: &Mutex<Vec<TaskRecord>>) -> bool {
    lock_records(records).iter().any(|record| record.error.is_some())
}

/// Drains `tasks` on at most `workers` threads and returns once all have finished.
fn run_pool(
    records: &Records,
    completed: &AtomicUsize,
    tasks: Vec<(usize, bool, TaskAction)>,
    workers: usize,
) {
    let workers = workers.min(tasks.len());
    let queue = Mutex::new(tasks.into_iter().collect::<VecDeque<_>>());
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                let Some((index, _, action)) = next else {
                    break;
                };
                execute(records, index, action);
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }
    });
}

fn execute(records: &Records, index: usize, action: TaskAction) {
    {
        let mut records = lock_records(records);
        let record = &mut records[index];
        record.state = TaskState::Running;
        record.started = Some(Instant::now());
    }

    let progress = Progress {
        records: Arc::clone(records),
        index,
    };
    let outcome = action(&progress);

    let mut records = lock_records(records);
    let record = &mut records[index];
    record.ended = Some(Instant::now());
    match outcome {
        Ok(state) => record.state = state,
        Err(err) => {
            tracing::warn!(task = %record.title, error = %err, "task failed");
            record.state = err.state;
            record.error = Some(err.message);
        }
    }
}

fn render_records(records: &[TaskRecord], prefixes: &Prefixes, printer: &Printer) {
    let style = printer.style();
    let rank = |state: TaskState| match state {
        TaskState::Running => 1,
        TaskState::Pending => 2,
        _ => 0,
    };
    let mut ordered: Vec<&TaskRecord> = records.iter().collect();
    ordered.sort_by_key(|record| rank(record.state));

    let now = Instant::now();
    printer.println("");
    for record in ordered {
        let elapsed = record
            .started
            .map(|started| {
                let elapsed = record.ended.unwrap_or(now).saturating_duration_since(started);
                style.gray(&format!("({})", duration_as_text(elapsed)))
            })
            .unwrap_or_default();
        let error = record
            .error
            .as_ref()
            .map(|message| style.error(&format!("({message})")))
            .unwrap_or_default();
        let title = record.title.clone();

        let parts = match record.state {
            TaskState::Pending => vec![style.gray(&prefixes.pending), title],
            TaskState::Running if record.progress.is_empty() => {
                vec![style.highlight(&prefixes.running), title, elapsed]
            }
            TaskState::Running => vec![
                style.highlight(&prefixes.running),
                format!("{title} ({})", record.progress),
                elapsed,
            ],
            TaskState::Warning => vec![style.warning(&prefixes.warning), title, elapsed, error],
            TaskState::Error => vec![style.error(&prefixes.error), title, elapsed, error],
            TaskState::Success => vec![style.success(&prefixes.success), title, elapsed],
            TaskState::Skipped => vec![style.gray(&prefixes.skipped), title, error],
        };
        let parts: Vec<String> = parts.into_iter().filter(|part| !part.is_empty()).collect();
        printer.println(&parts.join(" "));
    }
    printer.println("");
}

fn task_list_visual(records: Records, prefixes: Arc<Prefixes>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        render_records(&lock_records(&records), &prefixes, printer);
        Ok(())
    })
}

/// Spells out a duration as hours, minutes and whole seconds, e.g. `1 minute 5 seconds`.
pub fn duration_as_text(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        return "less than a second".to_string();
    }
    let total = duration.as_secs();
    let parts = [
        (total / 3600, "hour"),
        (total % 3600 / 60, "minute"),
        (total % 60, "second"),
    ];
    parts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| {
            let plural = if *count == 1 { "" } else { "s" };
            format!("{count} {unit}{plural}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
