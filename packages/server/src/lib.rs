// Site Audit API - Core
//
// Backend for a website audit product: crawls a submitted site, researches
// its market and asks an LLM for page-level suggestions.
//
// Background work is organized per-domain in domains/*/actions/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
