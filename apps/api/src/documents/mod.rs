// PDF comparison and summarization.
// Inputs arrive as URLs or multipart uploads; all model calls go through llm_client.

pub mod acquire;
pub mod handlers;
