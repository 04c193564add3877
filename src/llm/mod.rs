pub mod client;

pub use client::{LlmClient, ModelClient, ModelTier};
