use serde::{Deserialize, Serialize};

/// One submitted URL together with its position in the submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlTask {
    pub index: usize,
    pub url: String,
}

impl UrlTask {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }
}

/// An ordered slice of the submission handed to one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub tasks: Vec<UrlTask>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn urls(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.url.clone()).collect()
    }
}

/// Number the URLs in submission order.
pub fn tasks_from_urls<I, S>(urls: I) -> Vec<UrlTask>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    urls.into_iter()
        .enumerate()
        .map(|(index, url)| UrlTask::new(index, url))
        .collect()
}

/// Split tasks into consecutive batches of `batch_size` (the last may be shorter).
///
/// A zero batch size is treated as one.
pub fn partition(tasks: Vec<UrlTask>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(tasks.len().div_ceil(batch_size));
    let mut iter = tasks.into_iter().peekable();
    while iter.peek().is_some() {
        let tasks: Vec<UrlTask> = iter.by_ref().take(batch_size).collect();
        batches.push(Batch {
            index: batches.len(),
            tasks,
        });
    }
    batches
}
