pub mod backends;
pub mod factory;
pub mod ocr;

pub use backends::gemini::GeminiBackend;
pub use backends::mock::MockBackend;
pub use backends::ollama::OllamaBackend;
pub use backends::openai_compat::OpenAiCompatBackend;
pub use backends::GenerationOptions;
pub use factory::{build_backend, build_pipeline};
pub use ocr::{AzureReadOcr, OcrAssistedBackend, OcrEngine};
