use filedesk_core::AppError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// At-most-one guard for a long-running operation.
///
/// The permit is held for the whole operation; a second attempt while it is held fails
/// fast with [`AppError::Busy`] instead of queueing.
#[derive(Debug, Clone)]
pub struct OperationGuard {
    operation: &'static str,
    semaphore: Arc<Semaphore>,
}

impl OperationGuard {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit, AppError> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::Busy(self.operation))
    }

    pub fn is_held(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}
