//! # Home Intake
//!
//! A guided, voice-or-text conversational intake engine: it presents
//! questions one at a time, accepts free-form answers, persists them
//! durably, and decides what to ask next.
//!
//! ## Components
//!
//! - **Catalog**: versioned question set plus answer records (notes)
//! - **AnswerStore**: catalog (de)serialization over an opaque blob store
//! - **StoreGateway**: single-writer mutation serialization and ordered
//!   snapshot broadcast
//! - **FlowCoordinator**: current-question selection, answer validation and
//!   commit, category-specific derivation
//! - **SessionState**: the ephemeral draft for the active question
//!
//! ## Architecture
//!
//! ```text
//! input source → SessionState → FlowCoordinator → StoreGateway → AnswerStore
//!                                                      ↓
//!                                              subscribers (snapshots)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use home_intake::{AnswerStore, Config, FlowCoordinator, SqliteBlobStore, StoreGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let blobs = SqliteBlobStore::new(&config.store).await?;
//!     let store = AnswerStore::new(Arc::new(blobs));
//!     let gateway = StoreGateway::connect(store).await?;
//!     let mut flow = FlowCoordinator::new(gateway);
//!     while let Some(question) = flow.load_next_question().await? {
//!         // present question.text, gather input, then:
//!         // flow.save_answer(&input, None).await?;
//!         # let _ = question; break;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Boundary contracts for speech/text input and prompt output.
pub mod boundary;
/// Question catalog, notes, and the versioned snapshot type.
pub mod catalog;
/// Configuration management.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Flow coordination and category-specific derivation.
pub mod flow;
/// Store gateway: serialized mutations and snapshot broadcast.
pub mod gateway;
/// Session draft state for the active question.
pub mod session;
/// Answer store and persistence boundary.
pub mod store;

pub use catalog::{Catalog, Category, Note, Question};
pub use config::Config;
pub use error::{AppError, AppResult, FlowError, StoreError};
pub use flow::FlowCoordinator;
pub use gateway::StoreGateway;
pub use session::SessionState;
pub use store::{AnswerStore, BlobStore, SqliteBlobStore};
