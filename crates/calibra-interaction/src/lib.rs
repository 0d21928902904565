//! Oracle client layer: prompt construction, response parsing, the
//! Ollama-backed [`Oracle`](calibra_core::oracle::Oracle) implementation,
//! and deterministic fallbacks for when the service fails.

pub mod config;
pub mod fallback;
pub mod ollama_oracle;
pub mod parser;
pub mod prompts;

pub use config::OracleConfig;
pub use ollama_oracle::OllamaOracle;
