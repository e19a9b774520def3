// Conversational endpoints: provider-backed chat and the SSE echo stream.

pub mod handlers;
pub mod history;
