//! `hf-qa-http` is an async question-answering client for the Hugging Face
//! hosted inference API.
//!
//! A question and a context passage are posted to
//! `https://api-inference.huggingface.co/models/<model>` and the reply is
//! normalized into a uniform record. Rate-limited (429) and model-loading
//! (503) replies are retried with a linear backoff.
//!
//! - [`QaClient::answer`] returns a [`QueryResult`] record
//! - [`QaClient::ask`] returns a typed [`Answer`] or [`QaError`]

mod client;
mod config;
mod error;
mod normalize;
mod options;
mod text;
mod transport;
mod types;

pub use client::QaClient;
pub use config::{model_url, ConfigError, EndpointConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use error::QaError;
pub use options::ClientOptions;
pub use text::clean_text;
pub use transport::{HttpTransport, PostRequest, RawResponse, Transport, TransportError};
pub use types::{Answer, QueryRequest, QueryResult};

pub type Result<T> = std::result::Result<T, QaError>;
