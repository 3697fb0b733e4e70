//! Bridges the vision pipeline into the server's engine seam.
//!
//! Pipeline stages are CPU-bound and touch the scratch file, so every call
//! moves onto the blocking pool.

use std::sync::Arc;

use tokio::task;

use uqface_server::{EngineError, FaceEngine};
use uqface_vision::{Pipeline, PreparedImage, VisionError};

/// The production engine: the rustface/image pipeline behind blocking tasks.
pub struct CvEngine {
    pipeline: Arc<Pipeline>,
}

impl CvEngine {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

fn engine_error(error: VisionError) -> EngineError {
    match error {
        VisionError::Decode(_) => EngineError::InvalidImage,
        other => EngineError::Internal(other.to_string()),
    }
}

fn join_error(error: task::JoinError) -> EngineError {
    EngineError::Internal(format!("blocking task failed: {error}"))
}

impl FaceEngine for CvEngine {
    type Prepared = PreparedImage;

    async fn prepare(&self, image: Vec<u8>) -> Result<PreparedImage, EngineError> {
        let pipeline = Arc::clone(&self.pipeline);
        task::spawn_blocking(move || pipeline.prepare(&image))
            .await
            .map_err(join_error)?
            .map_err(engine_error)
    }

    fn face_count(prepared: &PreparedImage) -> usize {
        prepared.face_count()
    }

    async fn annotate(&self, mut prepared: PreparedImage) -> Result<Vec<u8>, EngineError> {
        let pipeline = Arc::clone(&self.pipeline);
        task::spawn_blocking(move || {
            pipeline.annotate(&mut prepared);
            pipeline.encode(&prepared)
        })
        .await
        .map_err(join_error)?
        .map_err(engine_error)
    }

    async fn composite(
        &self,
        mut prepared: PreparedImage,
        replacement: Vec<u8>,
    ) -> Result<Vec<u8>, EngineError> {
        let pipeline = Arc::clone(&self.pipeline);
        task::spawn_blocking(move || {
            pipeline.composite(&mut prepared, &replacement)?;
            pipeline.encode(&prepared)
        })
        .await
        .map_err(join_error)?
        .map_err(engine_error)
    }
}
