pub mod client;
pub mod requester;
pub mod types;

pub use client::{CompletionClient, GeminiClient};
pub use requester::{build_prompt, parse_reply, MappingRequester};
pub use types::{Confidence, FormMapping, MappedField, Profile, SubmitButton};
