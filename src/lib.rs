//! Book Generation Engine: expands a one-sentence idea into a structured
//! plan, builds a chapter (or page) outline, and generates each chapter
//! as a sequence of small validated beats, maintaining per-book state
//! across the run and applying deterministic post-processing before
//! the result is handed to persistence.
//!
//! [`Engine`] is the entry point: construct one with a [`llm::Gateway`],
//! a [`config::Config`], and a [`persistence::Persistence`] handle, then
//! call [`Engine::start_book`] on a freshly created [`book::Book`].

pub mod beats;
pub mod book;
pub mod chapter_gen;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod heat;
pub mod illustration;
pub mod json;
pub mod llm;
pub mod outline;
pub mod persistence;
pub mod plan;
pub mod postprocess;
pub mod state;
pub mod utils;
pub mod validators;

pub use book::{Book, BookStatus, BookType, Outline};
pub use config::Config;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use llm::{Gateway, ModelRole};
pub use plan::Plan;
