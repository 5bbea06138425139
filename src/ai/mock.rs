use super::ImageInferenceService;
use crate::models::{GenerationRequest, ImageResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum MockResponse {
    Results(Vec<ImageResult>),
    Failure(String),
}

/// Scripted inference client. Responses are replayed in order and cycle.
#[derive(Clone)]
pub struct MockImageInferenceClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageInferenceClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_results(self, results: Vec<ImageResult>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockResponse::Results(results));
        self
    }

    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockResponse::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockImageInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageInferenceService for MockImageInferenceClient {
    async fn image_inference(&self, request: &GenerationRequest) -> Result<Vec<ImageResult>> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(request.clone());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default: one image with a known cost
            return Ok(vec![ImageResult::with_url(format!(
                "https://mock-images.example.com/{}.jpg",
                request.task_uuid
            ))
            .with_cost(0.0038)]);
        }

        match &responses[(*count - 1) % responses.len()] {
            MockResponse::Results(results) => Ok(results.clone()),
            MockResponse::Failure(message) => Err(Error::Inference(message.clone())),
        }
    }
}
