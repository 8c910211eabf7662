#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A perturbation step `order` of `total` has started.
    OrderStart { order: usize, total: usize },

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `task` over `total_steps` items, bracketing it with task start/finish events.
    pub fn task<T>(&self, total_steps: u64, task: impl FnOnce() -> T) -> T {
        self.report(Progress::TaskStart { total_steps });
        let out = task();
        self.report(Progress::TaskFinish);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn task_brackets_events() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(format!("{:?}", event));
        }));
        let value = reporter.task(2, || {
            reporter.report(Progress::TaskIncrement);
            7
        });
        drop(reporter);
        assert_eq!(value, 7);
        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                "TaskStart { total_steps: 2 }".to_string(),
                "TaskIncrement".to_string(),
                "TaskFinish".to_string()
            ]
        );
    }
}
