//! Cooperative task queue over a program.
//!
//! Requests are queued as tasks and run one step at a time. A step never
//! interrupts a parse, bind or evaluation pass. A whole-program check
//! yields after each file and goes to the back of the queue, so newer
//! updates and queries run before it continues. A content update cancels
//! every check still in the queue.

use crate::cancellation::CancellationToken;
use crate::error::{ProgramError, ProgramResult};
use crate::program::Program;
use crate::program_queries::FileDiagnostics;
use pyz_common::ids::FileId;
use std::collections::VecDeque;
use tracing::{debug, trace};

pub type QueryFn = Box<dyn FnOnce(&mut Program)>;
pub type CheckCallback = Box<dyn FnOnce(ProgramResult<Vec<FileDiagnostics>>)>;

/// A whole-program check in progress.
pub struct CheckProgramTask {
    token: CancellationToken,
    /// Filled on the first step.
    remaining: Option<VecDeque<FileId>>,
    done: Vec<FileDiagnostics>,
    on_complete: CheckCallback,
}

pub enum Task {
    UpdateFile { path: String, content: String },
    RemoveFile { path: String },
    Query(QueryFn),
    CheckProgram(CheckProgramTask),
}

impl Task {
    fn name(&self) -> &'static str {
        match self {
            Task::UpdateFile { .. } => "update",
            Task::RemoveFile { .. } => "remove",
            Task::Query(_) => "query",
            Task::CheckProgram(_) => "check",
        }
    }
}

pub struct Scheduler {
    program: Program,
    queue: VecDeque<Task>,
    steps: u64,
}

impl Scheduler {
    pub fn new(program: Program) -> Self {
        Scheduler {
            program,
            queue: VecDeque::new(),
            steps: 0,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    /// Queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn cancel_checks(&self) {
        for task in &self.queue {
            if let Task::CheckProgram(check) = task {
                check.token.cancel();
            }
        }
    }

    pub fn update_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.cancel_checks();
        self.queue.push_back(Task::UpdateFile {
            path: path.into(),
            content: content.into(),
        });
    }

    pub fn remove_file(&mut self, path: impl Into<String>) {
        self.cancel_checks();
        self.queue.push_back(Task::RemoveFile { path: path.into() });
    }

    pub fn query(&mut self, run: impl FnOnce(&mut Program) + 'static) {
        self.queue.push_back(Task::Query(Box::new(run)));
    }

    /// Queue a whole-program check. `on_complete` receives the diagnostics
    /// of every file, or `Cancelled`. The returned token cancels the check.
    pub fn check_program(
        &mut self,
        on_complete: impl FnOnce(ProgramResult<Vec<FileDiagnostics>>) + 'static,
    ) -> CancellationToken {
        let token = CancellationToken::new();
        self.queue.push_back(Task::CheckProgram(CheckProgramTask {
            token: token.clone(),
            remaining: None,
            done: Vec::new(),
            on_complete: Box::new(on_complete),
        }));
        token
    }

    /// Run one step of the task at the front of the queue. `false` when the
    /// queue is empty.
    pub fn step(&mut self) -> bool {
        let Some(task) = self.queue.pop_front() else {
            return false;
        };
        self.steps += 1;
        trace!(task = task.name(), pending = self.queue.len(), "step");
        match task {
            Task::UpdateFile { path, content } => {
                self.program.update_file(&path, &content);
            }
            Task::RemoveFile { path } => {
                self.program.remove_file(&path);
            }
            Task::Query(run) => run(&mut self.program),
            Task::CheckProgram(check) => self.step_check(check),
        }
        true
    }

    fn step_check(&mut self, mut check: CheckProgramTask) {
        if check.token.is_cancelled() {
            debug!(checked = check.done.len(), "check cancelled");
            (check.on_complete)(Err(ProgramError::Cancelled));
            return;
        }
        let remaining = check.remaining.get_or_insert_with(|| {
            self.program.flush();
            self.program.check_targets().into_iter().collect()
        });
        if let Some(file) = remaining.pop_front() {
            match self.program.check_file_diagnostics(file) {
                Ok(result) => check.done.push(result),
                Err(ProgramError::FileNotFound { path }) => {
                    trace!(path, "skipping unreadable file");
                }
                Err(err) => {
                    (check.on_complete)(Err(err));
                    return;
                }
            }
        }
        if check.remaining.as_ref().is_some_and(|r| !r.is_empty()) {
            self.queue.push_back(Task::CheckProgram(check));
        } else {
            debug!(files = check.done.len(), "check complete");
            (check.on_complete)(Ok(check.done));
        }
    }

    /// Step until the queue is empty. Returns the number of steps taken.
    pub fn run_until_idle(&mut self) -> u64 {
        let start = self.steps;
        while self.step() {}
        self.steps - start
    }
}

#[cfg(test)]
#[path = "../tests/scheduler_tests.rs"]
mod scheduler_tests;
