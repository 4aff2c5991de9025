pub mod http;
pub mod orchestrator;

pub use http::HttpGenerationService;
pub use orchestrator::{
    GeneratedAnswer, GenerationOrchestrator, OrchestratorConfig, PROMPT_HEADROOM_CHARS,
};
