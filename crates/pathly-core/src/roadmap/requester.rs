//! Submit a roadmap request to a [`TextGenerator`] and parse the reply.

use thiserror::Error;
use tracing::debug;

use super::prompt::build_prompt;
use super::request::GenerationRequest;
use super::tree::RoadmapTree;
use crate::provider::{ProviderError, TextGenerator};

/// Why a generation attempt produced no usable tree.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider unreachable: {0}")]
    Network(String),

    #[error("provider error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("provider returned an empty reply")]
    EmptyResponse,

    #[error("reply is not a roadmap: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(msg) => Self::Network(msg),
            ProviderError::Service { status, message } => Self::Service { status, message },
        }
    }
}

/// Parse raw generator output into a [`RoadmapTree`].
///
/// The reply must be a bare JSON object. Markdown fences and surrounding
/// prose are parse errors.
pub fn parse_roadmap(raw: &str) -> Result<RoadmapTree, GenerationError> {
    if raw.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(serde_json::from_str(raw)?)
}

/// Make one generation attempt for `req`. No retries.
pub async fn request_roadmap(
    generator: &dyn TextGenerator,
    req: &GenerationRequest,
) -> Result<RoadmapTree, GenerationError> {
    let prompt = build_prompt(req);
    debug!(
        provider = generator.name(),
        skill = req.skill_name(),
        instruction_bytes = prompt.instruction.len(),
        "requesting roadmap"
    );

    let raw = generator.generate(&prompt).await?;
    let tree = parse_roadmap(&raw)?;

    debug!(
        weeks = tree.weeks.len(),
        modules = tree.module_count(),
        "roadmap parsed"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pathly_db::models::Difficulty;

    use super::*;
    use crate::provider::GenerationPrompt;

    /// Returns a fixed reply and remembers the prompts it was given.
    struct Scripted {
        reply: Result<String, fn() -> ProviderError>,
        prompts: Mutex<Vec<GenerationPrompt>>,
    }

    impl Scripted {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(make: fn() -> ProviderError) -> Self {
            Self {
                reply: Err(make),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    const ONE_WEEK: &str = r#"{"skill": "Rust", "difficulty": "Expert", "duration_days": 7,
        "weeks": [{"week": 1, "focus": "Ownership", "modules": [{
            "module_id": "W1-M1", "title": "Borrowing", "objective": "Lend data safely",
            "learning_type": "practice", "difficulty_tag": "expert",
            "estimated_time_minutes": 50, "sequence_order": 1,
            "tasks": [{"title": "Fight the borrow checker", "contentType": "exercise",
                       "description": "Fix five errors", "contentLink": ""}]
        }]}]}"#;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Rust", 7, Difficulty::Expert).unwrap()
    }

    #[test]
    fn parse_rejects_blank_reply() {
        assert!(matches!(parse_roadmap(""), Err(GenerationError::EmptyResponse)));
        assert!(matches!(parse_roadmap(" \n\t"), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn parse_rejects_fenced_json() {
        let fenced = format!("```json\n{ONE_WEEK}\n```");
        assert!(matches!(parse_roadmap(&fenced), Err(GenerationError::Parse(_))));
    }

    #[test]
    fn parse_rejects_prose() {
        let prose = format!("Here is your roadmap: {ONE_WEEK}");
        assert!(matches!(parse_roadmap(&prose), Err(GenerationError::Parse(_))));
    }

    #[test]
    fn parse_tolerates_extra_fields() {
        let json = r#"{"weeks": [], "motivation": "you can do it"}"#;
        let tree = parse_roadmap(json).unwrap();
        assert!(tree.weeks.is_empty());
    }

    #[tokio::test]
    async fn request_parses_valid_reply() {
        let generator = Scripted::ok(ONE_WEEK);
        let tree = request_roadmap(&generator, &request()).await.unwrap();
        assert_eq!(tree.weeks.len(), 1);
        assert_eq!(tree.weeks[0].modules[0].title, "Borrowing");
    }

    #[tokio::test]
    async fn request_sends_one_json_prompt() {
        let generator = Scripted::ok(ONE_WEEK);
        request_roadmap(&generator, &request()).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].json_output);
        assert!(prompts[0].user_message.contains("skill_name: Rust"));
    }

    #[tokio::test]
    async fn provider_failures_map_to_generation_errors() {
        let generator = Scripted::failing(|| ProviderError::Network("connection refused".into()));
        let err = request_roadmap(&generator, &request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));

        let generator = Scripted::failing(|| ProviderError::Service {
            status: Some(500),
            message: "boom".into(),
        });
        let err = request_roadmap(&generator, &request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Service { status: Some(500), .. }));
        assert_eq!(err.to_string(), "provider error (500): boom");
    }

    #[tokio::test]
    async fn failing_provider_is_called_once() {
        let generator = Scripted::failing(|| ProviderError::Network("timeout".into()));
        let _ = request_roadmap(&generator, &request()).await;
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }
}
