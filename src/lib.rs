//! modelrag: per-model retrieval-augmented generation over uploaded documents
//!
//! Documents uploaded for a model are read, chunked, embedded and stored in a
//! vector collection; questions are answered by retrieving the closest chunks
//! and handing them to a local LLM.

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod llm;
pub mod namespace;
pub mod parse;
pub mod pipeline;
pub mod reader;
pub mod server;
pub mod store;
