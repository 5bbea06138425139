//! Single-request generation flow: build the request, call the provider,
//! interpret the result and compose the reply.

use crate::ai::ImageInferenceService;
use crate::messages;
use crate::models::{GenerationProfile, GenerationRequest, ImageResult};
use uuid::Uuid;

/// Terminal outcome of one `/img` invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { image_url: String, cost: Option<f64> },
    NoImage,
    Failure { diagnostic: String },
}

/// The single reply sent to the user once generation finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text { text: String },
    Photo { url: String, caption: String, spoiler: bool },
}

pub fn build_request(prompt: &str, profile: &GenerationProfile) -> GenerationRequest {
    GenerationRequest {
        task_uuid: Uuid::new_v4(),
        prompt: prompt.to_string(),
        profile: profile.clone(),
    }
}

/// Only the first entry is considered; any further entries are ignored.
pub fn interpret(results: &[ImageResult]) -> Outcome {
    let Some(first) = results.first() else {
        return Outcome::NoImage;
    };

    match first.image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Outcome::Success {
            image_url: url.to_string(),
            cost: first.cost,
        },
        _ => Outcome::NoImage,
    }
}

pub fn compose(outcome: &Outcome) -> OutboundMessage {
    match outcome {
        Outcome::NoImage => OutboundMessage::Text {
            text: messages::NO_IMAGE.to_string(),
        },
        Outcome::Success { image_url, cost } => {
            // A zero cost is reported as unknown, like a missing one.
            let cost = match cost {
                Some(value) if *value > 0.0 => value.to_string(),
                _ => messages::UNKNOWN_COST.to_string(),
            };
            OutboundMessage::Photo {
                url: image_url.clone(),
                caption: messages::render(messages::COST_CAPTION, &[("cost", &cost)]),
                spoiler: true,
            }
        }
        Outcome::Failure { diagnostic } => {
            let frame = messages::render(messages::GENERATION_ERROR, &[("trace", "")]);
            let room = messages::MAX_MESSAGE_CHARS.saturating_sub(frame.chars().count());
            OutboundMessage::Text {
                text: messages::render(
                    messages::GENERATION_ERROR,
                    &[("trace", &messages::escape_html_truncated(diagnostic, room))],
                ),
            }
        }
    }
}

/// Runs request build, provider call and interpretation; errors become [`Outcome::Failure`].
pub async fn generate(
    inference: &dyn ImageInferenceService,
    prompt: &str,
    profile: &GenerationProfile,
) -> Outcome {
    let request = build_request(prompt, profile);
    match inference.image_inference(&request).await {
        Ok(results) => interpret(&results),
        Err(e) => {
            tracing::error!("Image inference task {} failed: {}", request.task_uuid, e);
            Outcome::Failure {
                diagnostic: e.diagnostic(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockImageInferenceClient;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_request_passes_prompt_through() {
        let profile = GenerationProfile::default();
        let request = build_request("  a <weird> prompt  ", &profile);
        assert_eq!(request.prompt, "  a <weird> prompt  ");
        assert_eq!(request.profile, profile);
    }

    #[test]
    fn test_build_request_fresh_task_uuid() {
        let profile = GenerationProfile::default();
        let a = build_request("x", &profile);
        let b = build_request("x", &profile);
        assert_ne!(a.task_uuid, b.task_uuid);
    }

    #[test]
    fn test_interpret_empty_is_no_image() {
        assert_eq!(interpret(&[]), Outcome::NoImage);
    }

    #[test]
    fn test_interpret_missing_or_blank_url_is_no_image() {
        assert_eq!(interpret(&[ImageResult::default().with_cost(0.1)]), Outcome::NoImage);
        assert_eq!(interpret(&[ImageResult::with_url("")]), Outcome::NoImage);
    }

    #[test]
    fn test_interpret_uses_first_entry_only() {
        let results = vec![
            ImageResult::with_url("https://img.test/1.jpg").with_cost(0.01),
            ImageResult::with_url("https://img.test/2.jpg").with_cost(0.02),
        ];
        assert_eq!(
            interpret(&results),
            Outcome::Success {
                image_url: "https://img.test/1.jpg".to_string(),
                cost: Some(0.01),
            }
        );

        let results = vec![ImageResult::default(), ImageResult::with_url("https://img.test/2.jpg")];
        assert_eq!(interpret(&results), Outcome::NoImage);
    }

    #[test]
    fn test_compose_success_with_cost() {
        let message = compose(&Outcome::Success {
            image_url: "https://img.test/1.jpg".to_string(),
            cost: Some(0.0038),
        });
        assert_eq!(
            message,
            OutboundMessage::Photo {
                url: "https://img.test/1.jpg".to_string(),
                caption: "З генерації цього зображення автор бота втратив 0.0038$".to_string(),
                spoiler: true,
            }
        );
    }

    #[test]
    fn test_compose_success_without_cost_uses_unknown_token() {
        let OutboundMessage::Photo { caption, spoiler, .. } = compose(&Outcome::Success {
            image_url: "https://img.test/1.jpg".to_string(),
            cost: None,
        }) else {
            panic!("expected a photo message");
        };
        assert!(caption.contains(messages::UNKNOWN_COST));
        assert!(spoiler);
    }

    #[test]
    fn test_compose_zero_cost_uses_unknown_token() {
        let OutboundMessage::Photo { caption, .. } = compose(&Outcome::Success {
            image_url: "https://img.test/1.jpg".to_string(),
            cost: Some(0.0),
        }) else {
            panic!("expected a photo message");
        };
        assert_eq!(
            caption,
            "З генерації цього зображення автор бота втратив невідомо$"
        );
    }

    #[test]
    fn test_compose_no_image() {
        assert_eq!(
            compose(&Outcome::NoImage),
            OutboundMessage::Text {
                text: messages::NO_IMAGE.to_string()
            }
        );
    }

    #[test]
    fn test_compose_failure_escapes_trace_inside_blockquote() {
        let OutboundMessage::Text { text } = compose(&Outcome::Failure {
            diagnostic: "Inference: status <500>".to_string(),
        }) else {
            panic!("expected a text message");
        };
        assert!(text.contains("<blockquote expandable>Inference: status &lt;500&gt;</blockquote>"));
    }

    #[test]
    fn test_compose_failure_fits_message_limit() {
        let diagnostic = format!(
            "Inference: Runware API error (status 502 Bad Gateway): {}",
            "<p>x</p>".repeat(625)
        );
        let OutboundMessage::Text { text } = compose(&Outcome::Failure { diagnostic }) else {
            panic!("expected a text message");
        };
        assert!(text.chars().count() <= messages::MAX_MESSAGE_CHARS);
        assert!(text.contains("(status 502 Bad Gateway): &lt;p&gt;x&lt;/p&gt;"));
        assert!(text.ends_with("…</blockquote>"));
    }

    #[tokio::test]
    async fn test_generate_maps_provider_error_to_failure() {
        let client = MockImageInferenceClient::new().with_error("insufficient credits");
        let outcome = generate(&client, "a cat", &GenerationProfile::default()).await;

        match outcome {
            Outcome::Failure { diagnostic } => assert!(diagnostic.contains("insufficient credits")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let client = MockImageInferenceClient::new()
            .with_results(vec![ImageResult::with_url("https://img.test/cat.jpg")]);
        let outcome = generate(&client, "a cat", &GenerationProfile::default()).await;

        assert_eq!(
            outcome,
            Outcome::Success {
                image_url: "https://img.test/cat.jpg".to_string(),
                cost: None,
            }
        );
        assert_eq!(client.get_requests()[0].prompt, "a cat");
    }
}
