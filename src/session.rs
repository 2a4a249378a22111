use serde::Serialize;

use crate::models::{GenerationResult, ImageReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Idle,
    Pending,
    Success(GenerationResult),
    Failed(String),
}

/// Identifies one submission. Only the most recent ticket may write results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// What the view currently shows: the staged image and the lifecycle of the last submission.
#[derive(Debug)]
pub struct GenerationSession {
    status: GenerationStatus,
    staged_image: Option<ImageReference>,
    request_generation: u64,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self {
            status: GenerationStatus::Idle,
            staged_image: None,
            request_generation: 0,
        }
    }
}

impl GenerationSession {
    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn staged_image(&self) -> Option<&ImageReference> {
        self.staged_image.as_ref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.status {
            GenerationStatus::Success(result) => Some(result),
            _ => None,
        }
    }

    /// Replaces the staged image and drops whatever the previous submission produced.
    pub fn stage_image(&mut self, image: ImageReference) {
        self.staged_image = Some(image);
        self.status = GenerationStatus::Idle;
    }

    pub fn begin(&mut self) -> RequestTicket {
        self.request_generation += 1;
        self.status = GenerationStatus::Pending;
        RequestTicket(self.request_generation)
    }

    /// Records a finished submission. Returns `false` and leaves state alone when a newer
    /// submission was started or the session was reset in the meantime.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<GenerationResult, String>,
    ) -> bool {
        if ticket.0 != self.request_generation {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.request_generation,
                "discarding stale generation outcome"
            );
            return false;
        }

        self.status = match outcome {
            Ok(result) => GenerationStatus::Success(result),
            Err(message) => GenerationStatus::Failed(message),
        };
        true
    }

    /// Surfaces an error raised before any request was issued.
    pub fn reject(&mut self, message: String) {
        self.status = GenerationStatus::Failed(message);
    }

    pub fn reset(&mut self) {
        self.staged_image = None;
        self.status = GenerationStatus::Idle;
        // Invalidate anything still in flight.
        self.request_generation += 1;
    }
}
