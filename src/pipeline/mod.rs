pub mod chat;
pub mod context;
pub mod gemini;
pub mod ingest;
