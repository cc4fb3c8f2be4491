use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use crate::grader::Submission;

pub struct SubmissionQueue {
    queue: Mutex<VecDeque<Submission>>,
    notify: Notify,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    pub async fn push(&self, submission: Submission) {
        self.queue.lock().await.push_back(submission);
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> Submission {
        loop {
            if let Some(submission) = self.queue.lock().await.pop_front() {
                return submission;
            }
            self.notify.notified().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}
