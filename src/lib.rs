//! aaoifi-kb - ranked, budget-limited excerpts from the AAOIFI standards.
//!
//! The standards document is loaded once (from a cached text file, or page
//! by page from the PDF), split into overlapping chunks, and scored against
//! each question by term frequency. The best chunks come back as
//! page-labelled blocks that an Islamic finance advisor can prepend to the
//! user's question.
//!
//! # Quick start
//!
//! ```no_run
//! use aaoifi_kb::{DataDir, KnowledgeBase, KnowledgeConfig};
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let config = KnowledgeConfig::resolve(&data_dir).unwrap();
//! let kb = KnowledgeBase::new(config);
//!
//! // Empty when disabled, unavailable, or nothing matches.
//! let context = kb.get_relevant_context("Is a fixed-rate bond riba?", 2000);
//! if !context.is_empty() {
//!     println!("{context}");
//! }
//! ```

pub mod advisor;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod knowledge;
pub mod loader;
pub mod mcp;
pub mod search;

pub use config::{DataDir, KnowledgeConfig};
pub use error::{Error, Result};
pub use knowledge::{KnowledgeBase, KnowledgeStatus};
pub use loader::{ContentLoader, ContentSource};
