//! Remote dispatch of composed prompts.
//!
//! The remote call is opaque: a prompt goes in, response text comes out.
//! Errors are surfaced as [`crate::error::TagsmithError::DispatchError`] and
//! never retried.

mod anthropic;
mod code_block;

pub use anthropic::AnthropicDispatch;
pub use code_block::{CodeBlock, extract_code_block};

use crate::error::Result;

/// A remote model endpoint.
pub trait RemoteDispatch {
    /// Send `prompt` and return the response text.
    fn send(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}
