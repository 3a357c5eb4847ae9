//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories and transactions using Diesel
//! - **memory**: in-process store for tests and database-less development
//! - **stripe**: payment links and webhook signature verification
//! - **notifications**: broadcast hub feeding the WebSocket side-channel
//! - **storage**: local object storage with signed download URLs
//! - **security**: Argon2 password hashing
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod memory;
pub mod notifications;
pub mod persistence;
pub mod security;
pub mod storage;
pub mod stripe;
