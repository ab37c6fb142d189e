mod factory;
mod gemini;
mod imagen;
mod mock;
mod openai;

pub use factory::{create_image_provider, create_provider, resolve_exa_api_key};
pub use gemini::GeminiProvider;
pub use imagen::ImagenProvider;
pub use mock::{MockImageProvider, MockProvider};
pub use openai::OpenAIProvider;
