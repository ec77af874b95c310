//! AI provider adapters: prompt assembly, structured output handling,
//! per-provider clients, and routing.

pub mod gemini;
pub mod images;
pub mod openai;
pub mod prompt;
pub mod retry;
pub mod router;
pub mod structured;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use retry::PreviewRetryPolicy;
pub use router::AiClientRouter;
