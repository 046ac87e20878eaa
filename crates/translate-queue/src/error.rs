#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("translation queue full ({queued_and_active}/{max_queue})")]
    QueueFull { queued_and_active: usize, max_queue: usize },
}
