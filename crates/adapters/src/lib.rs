//! infopost adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `llm`: generative-text providers (Gemini, stub)
//! - `bluesky`: Bluesky publishing adapter

pub mod bluesky;
pub mod llm;
