use std::{collections::HashMap, sync::Arc};

use tracing::error;

use crate::models::{Queue, TaskMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    NoRetry,
    Retry,
}

/// A named unit of work consumed from one queue.
#[async_trait::async_trait]
pub trait ITask: Send + Sync {
    fn name(&self) -> &'static str;
    fn queue(&self) -> Queue;
    async fn work(&self, message: &TaskMessage) -> Result<(), WorkError>;
}

#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<dyn ITask>>,
}

impl TaskRegistry {
    pub fn register(&mut self, task: Arc<dyn ITask>) -> &mut Self {
        self.tasks.insert(task.queue().subject(task.name()), task);
        self
    }

    pub fn resolve(&self, subject: &str) -> Option<Arc<dyn ITask>> {
        self.tasks.get(subject).cloned()
    }

    pub fn queues(&self) -> Vec<Queue> {
        let mut queues: Vec<Queue> = vec![];
        for task in self.tasks.values() {
            if !queues.contains(&task.queue()) {
                queues.push(task.queue());
            }
        }
        queues
    }

    pub async fn dispatch(&self, subject: &str, payload: &[u8]) -> Result<(), WorkError> {
        let task = self.resolve(subject).ok_or_else(|| {
            error!("No task registered for {}", subject);
            WorkError::NoRetry
        })?;
        let message = TaskMessage::from_json_slice(payload).map_err(|err| {
            error!("Dropping message for {}: {}", subject, err);
            WorkError::NoRetry
        })?;
        task.work(&message).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingTask {
        seen: Mutex<Vec<TaskMessage>>,
    }

    #[async_trait::async_trait]
    impl ITask for RecordingTask {
        fn name(&self) -> &'static str {
            "record"
        }

        fn queue(&self) -> Queue {
            Queue::Update
        }

        async fn work(&self, message: &TaskMessage) -> Result<(), WorkError> {
            self.seen.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn registry() -> (TaskRegistry, Arc<RecordingTask>) {
        let task = Arc::new(RecordingTask { seen: Mutex::new(vec![]) });
        let mut registry = TaskRegistry::default();
        registry.register(task.clone());
        (registry, task)
    }

    #[tokio::test]
    async fn dispatches_by_subject() {
        let (registry, task) = registry();
        registry.dispatch("update.record", br#"{"objectId":5}"#).await.unwrap();
        assert_eq!(task.seen.lock().unwrap().as_slice(), &[TaskMessage::for_object(5)]);
        assert_eq!(registry.queues(), vec![Queue::Update]);
    }

    #[tokio::test]
    async fn unknown_subjects_and_bad_payloads_are_not_retried() {
        let (registry, task) = registry();
        assert_eq!(registry.dispatch("cleanup.record", b"{}").await, Err(WorkError::NoRetry));
        assert_eq!(registry.dispatch("update.unknown", b"{}").await, Err(WorkError::NoRetry));
        assert_eq!(registry.dispatch("update.record", b"[").await, Err(WorkError::NoRetry));
        assert!(task.seen.lock().unwrap().is_empty());
    }
}
