use super::client::RunwareHttpClient;
use super::types::{ImageInferenceTask, TaskResponse};
use crate::ai::ImageInferenceService;
use crate::models::{GenerationRequest, ImageResult};
use crate::{Error, Result};
use async_trait::async_trait;

pub struct RunwareImageClient {
    http: RunwareHttpClient,
}

impl RunwareImageClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: RunwareHttpClient::new(api_key),
        }
    }

    pub fn new_with_client(api_key: String, client: reqwest::Client) -> Self {
        Self {
            http: RunwareHttpClient::new_with_client(api_key, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn task_for(request: &GenerationRequest) -> ImageInferenceTask {
        let profile = &request.profile;
        ImageInferenceTask {
            task_type: "imageInference",
            task_uuid: request.task_uuid.to_string(),
            positive_prompt: request.prompt.clone(),
            model: profile.model.air_id().to_string(),
            number_results: profile.number_results,
            width: profile.width,
            height: profile.height,
            steps: profile.steps,
            cfg_scale: profile.cfg_scale,
            use_cache: profile.use_cache,
            include_cost: profile.include_cost,
            output_type: "URL",
        }
    }
}

#[async_trait]
impl ImageInferenceService for RunwareImageClient {
    async fn image_inference(&self, request: &GenerationRequest) -> Result<Vec<ImageResult>> {
        tracing::debug!(
            "Sending imageInference task {} to Runware (model: {})",
            request.task_uuid,
            request.profile.model
        );

        let tasks = [Self::task_for(request)];
        let response: TaskResponse = self.http.post("/v1", &tasks).await?;

        if !response.errors.is_empty() {
            let reasons: Vec<String> = response.errors.iter().map(|e| e.to_string()).collect();
            tracing::error!("Runware reported task errors: {}", reasons.join("; "));
            return Err(Error::Inference(reasons.join("; ")));
        }

        let task_uuid = request.task_uuid.to_string();
        Ok(response
            .data
            .into_iter()
            .filter(|entry| {
                entry.task_type.as_deref().map_or(true, |t| t == "imageInference")
                    && entry.task_uuid.as_deref().map_or(true, |id| id == task_uuid)
            })
            .map(|entry| ImageResult {
                task_uuid: entry.task_uuid,
                image_uuid: entry.image_uuid,
                image_url: entry.image_url,
                cost: entry.cost,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::build_request;
    use crate::models::{GenerationProfile, ImageModel};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RunwareImageClient {
        RunwareImageClient::new("test-key".to_string()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_image_inference_sends_fixed_profile() {
        let server = MockServer::start().await;
        let request = build_request("a red fox in snow", &GenerationProfile::default());

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!([{
                "taskType": "imageInference",
                "taskUUID": request.task_uuid.to_string(),
                "positivePrompt": "a red fox in snow",
                "model": "runware:101@1",
                "numberResults": 1,
                "width": 1024,
                "height": 1024,
                "steps": 30,
                "CFGScale": 10.0,
                "useCache": false,
                "includeCost": true
            }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "taskType": "imageInference",
                    "taskUUID": request.task_uuid.to_string(),
                    "imageUUID": "b7db282d-2943-4f12-992f-77df3ad3ec71",
                    "imageURL": "https://im.runware.ai/image/ws/0.5/ii/b7db.jpg",
                    "cost": 0.0038
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server).image_inference(&request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].image_url.as_deref(),
            Some("https://im.runware.ai/image/ws/0.5/ii/b7db.jpg")
        );
        assert_eq!(results[0].cost, Some(0.0038));
    }

    #[tokio::test]
    async fn test_image_inference_uses_selected_model() {
        let server = MockServer::start().await;
        let profile = GenerationProfile::default().with_model(ImageModel::FluxSchnell);
        let request = build_request("lighthouse", &profile);

        Mock::given(method("POST"))
            .and(body_partial_json(
                serde_json::json!([{ "model": "runware:100@1" }]),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server).image_inference(&request).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_image_inference_keeps_entries_without_url_or_cost() {
        let server = MockServer::start().await;
        let request = build_request("a cat", &GenerationProfile::default());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "taskType": "imageInference", "imageUUID": "x" }]
            })))
            .mount(&server)
            .await;

        let results = client_for(&server).image_inference(&request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].image_url, None);
        assert_eq!(results[0].cost, None);
    }

    #[tokio::test]
    async fn test_image_inference_reports_task_errors() {
        let server = MockServer::start().await;
        let request = build_request("a cat", &GenerationProfile::default());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{
                    "code": "insufficientCredits",
                    "message": "Insufficient credits to process the request.",
                    "taskUUID": request.task_uuid.to_string()
                }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).image_inference(&request).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert!(err.to_string().contains("insufficientCredits"));
    }

    #[tokio::test]
    async fn test_image_inference_api_error_is_single_attempt() {
        let server = MockServer::start().await;
        let request = build_request("a cat", &GenerationProfile::default());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).image_inference(&request).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_image_inference_malformed_body() {
        let server = MockServer::start().await;
        let request = build_request("a cat", &GenerationProfile::default());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).image_inference(&request).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse Runware response"));
    }
}
