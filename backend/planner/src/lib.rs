pub mod providers;

pub use providers::mock::MockProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openai::OpenAiProvider;
pub use providers::ProviderRegistry;
