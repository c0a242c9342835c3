// src/progress.rs
/// Progress reporting for an ingestion run (pages fetched, stages done).
/// Frontends implement this to surface status; the library never prints.
pub trait Progress {
    /// Called at the start with the number of stages (if known).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called when one stage completes.
    fn item_done(&mut self, _stage: usize) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Forwards status lines to the log at info level.
#[derive(Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn log(&mut self, msg: &str) {
        logf!("{}", msg);
    }

    fn item_done(&mut self, _stage: usize) {
        self.done += 1;
        logd!("Progress: {}/{}", self.done, self.total);
    }
}
