//! Image generation collaborator.
//!
//! Jobs are handed to [`GenerationQueue`] and never awaited by the caller.
//! Completion is observed later through the cast store, when the generator
//! records the finished image path.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::CastId;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// One request to remix a source image into the cast `cast_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub name: String,
    pub image_path: String,
    pub prompt: String,
    pub cast_id: CastId,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation queue is closed")]
    QueueClosed,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, job: &GenerationJob) -> Result<(), GenerationError>;
}

/// Posts jobs as JSON to an external generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    http: Client,
    endpoint: Url,
}

impl HttpImageGenerator {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, job: &GenerationJob) -> Result<(), GenerationError> {
        self.http
            .post(self.endpoint.clone())
            .json(job)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Stand-in used when no generation endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingImageGenerator;

#[async_trait]
impl ImageGenerator for LoggingImageGenerator {
    async fn generate(&self, job: &GenerationJob) -> Result<(), GenerationError> {
        info!(
            cast_id = job.cast_id.0,
            source = %job.image_path,
            prompt = %job.prompt,
            "no generation endpoint configured; job dropped"
        );
        Ok(())
    }
}

#[derive(Debug)]
struct QueuedJob {
    job_id: Uuid,
    job: GenerationJob,
}

/// Fire-and-forget executor for generation jobs.
#[derive(Clone)]
pub struct GenerationQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
}

impl GenerationQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(generator: Arc<dyn ImageGenerator>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedJob>();
        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                let generator = Arc::clone(&generator);
                tokio::spawn(run_job(generator, queued));
            }
        });
        Self { tx }
    }

    pub fn submit(&self, job: GenerationJob) -> Result<Uuid, GenerationError> {
        let job_id = Uuid::new_v4();
        self.tx
            .send(QueuedJob { job_id, job })
            .map_err(|_| GenerationError::QueueClosed)?;
        Ok(job_id)
    }
}

async fn run_job(generator: Arc<dyn ImageGenerator>, queued: QueuedJob) {
    let QueuedJob { job_id, job } = queued;
    match generator.generate(&job).await {
        Ok(()) => info!(%job_id, cast_id = job.cast_id.0, "generation requested"),
        Err(error) => warn!(
            %job_id,
            cast_id = job.cast_id.0,
            %error,
            "generation request failed; cast stays pending"
        ),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
