mod client;
mod sse;

pub use client::{GenerationClient, GenerationEvent, GenerationRequest};
