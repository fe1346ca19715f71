// src/llm/mod.rs

pub mod backend;
pub mod gateway;
pub mod invoker;
pub mod provider;

pub use backend::{base_model_name, is_model_available, InferenceBackend, OllamaBackend};
pub use gateway::{ModelGateway, ModelHandle};
pub use invoker::{BoundedInvoker, InvokeError, TimeoutPolicy};
pub use provider::{LLMError, LLMProvider, OllamaProvider};
