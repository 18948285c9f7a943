use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::{
    error::{GenerationError, Result},
    generation::{GenerationRequest, ImageGenerator},
};

/// Caps the number of generations running against a shared backend
///
/// With a limit of 1 every request is serialized on the model; waiting
/// callers are admitted in FIFO order.
pub struct LimitedGenerator {
    inner: Arc<dyn ImageGenerator>,
    permits: Semaphore,
    limit: usize,
}

impl LimitedGenerator {
    pub fn new(inner: Arc<dyn ImageGenerator>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            inner,
            permits: Semaphore::new(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of generations that could start right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl ImageGenerator for LimitedGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage> {
        if self.permits.available_permits() == 0 {
            debug!("Waiting for a free {} slot (limit {})", self.inner.name(), self.limit);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GenerationError::RequestFailed {
                reason: "generator is shutting down".to_string(),
            })?;

        self.inner.generate(request).await
    }
}
