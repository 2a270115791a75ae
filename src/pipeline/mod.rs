pub mod crowns;
pub mod elevation;
pub mod instantiate;
pub mod raycast;
pub mod segmentation;

use thiserror::Error;

pub use crowns::DetectionResult;
pub use elevation::ElevationMap;
pub use instantiate::TreeInstantiationResult;
pub use raycast::CastingResult;

/// Type tag for a stage's declared input/output. Chain compatibility is
/// checked against these once, when the list is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    Empty,
    Instantiation,
    Casting,
    Elevation,
    Detection,
}

/// The value passed between stages.
pub enum TaskIo {
    Empty,
    Instantiation(TreeInstantiationResult),
    Casting(CastingResult),
    Elevation(ElevationMap),
    Detection(DetectionResult),
}

impl TaskIo {
    pub fn kind(&self) -> IoKind {
        match self {
            TaskIo::Empty => IoKind::Empty,
            TaskIo::Instantiation(_) => IoKind::Instantiation,
            TaskIo::Casting(_) => IoKind::Casting,
            TaskIo::Elevation(_) => IoKind::Elevation,
            TaskIo::Detection(_) => IoKind::Detection,
        }
    }
}

/// A resumable pipeline stage. After `take_input`, `continue_processing` is
/// polled once per scheduling tick until it reports 1.0; `take_result` may
/// then be called exactly once. Feeding input twice or retrieving a result
/// twice is a programming error.
pub trait Task {
    fn description(&self) -> String;
    fn input_kind(&self) -> IoKind;
    fn output_kind(&self) -> IoKind;
    fn take_input(&mut self, input: TaskIo);
    fn continue_processing(&mut self) -> f64;
    fn take_result(&mut self) -> TaskIo;
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "input type {input:?} of task `{task}` does not match the output type {output:?} of the previous task"
    )]
    TypeMismatch {
        task: String,
        input: IoKind,
        output: IoKind,
    },
}

/// Ordered stage chain, validated at construction.
pub struct TaskList {
    tasks: Vec<Box<dyn Task>>,
}

impl TaskList {
    pub fn starting_with(first: Box<dyn Task>) -> Self {
        Self { tasks: vec![first] }
    }

    pub fn with(mut self, next: Box<dyn Task>) -> Result<Self, PipelineError> {
        let previous_output = self.tasks[self.tasks.len() - 1].output_kind();
        if next.input_kind() != previous_output {
            return Err(PipelineError::TypeMismatch {
                task: next.description(),
                input: next.input_kind(),
                output: previous_output,
            });
        }
        self.tasks.push(next);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn get_mut(&mut self, index: usize) -> &mut Box<dyn Task> {
        &mut self.tasks[index]
    }
}

/// Drives a task list one bounded increment per call. The caller owns the
/// manager and decides the tick cadence; nothing here runs concurrently.
pub struct TaskManager {
    task_list: Option<TaskList>,
    current_task: usize,
    progress: f64,
    processing: bool,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        Self { task_list: None, current_task: 0, progress: 0.0, processing: false }
    }

    pub fn run(&mut self, task_list: TaskList) {
        // The first stage of a chain takes no upstream value.
        debug_assert!(!task_list.is_empty());
        self.task_list = Some(task_list);
        self.current_task = 0;
        self.progress = 0.0;
        self.processing = true;
        if let Some(list) = self.task_list.as_mut() {
            list.get_mut(0).take_input(TaskIo::Empty);
        }
    }

    pub fn processing(&self) -> bool {
        self.processing
    }

    /// Overall progress across the chain, in [0, 1].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn description(&self) -> String {
        match &self.task_list {
            Some(list) if self.current_task < list.len() => {
                list.tasks[self.current_task].description()
            }
            _ => "Finished!".to_string(),
        }
    }

    /// Advance the current stage by one increment. When a stage completes,
    /// its result is handed to the next stage's input.
    pub fn continue_if_processing(&mut self) {
        if !self.processing || self.progress >= 1.0 {
            return;
        }
        let Some(list) = self.task_list.as_mut() else {
            return;
        };

        let count = list.len();
        let task_progress = list.get_mut(self.current_task).continue_processing();
        self.progress = (self.current_task as f64 + task_progress) / count as f64;
        if task_progress >= 1.0 {
            if self.current_task < count - 1 {
                let output = list.get_mut(self.current_task).take_result();
                list.get_mut(self.current_task + 1).take_input(output);
            }
            self.current_task += 1;
        }
    }

    pub fn stop(&mut self) {
        self.progress = 0.0;
        self.processing = false;
        self.task_list = None;
    }
}
