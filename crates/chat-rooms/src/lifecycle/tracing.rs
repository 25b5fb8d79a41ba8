//! # Tracing
//!
//! [`setup_tracing`] installs the process-wide subscriber. Levels come from `RUST_LOG`.
//!
//! ```bash
//! # Joins, leaves, censored messages and sessions
//! RUST_LOG=info cargo run -p chat-rooms
//!
//! # Every client request and dropped message
//! RUST_LOG=debug cargo run -p chat-rooms
//!
//! # Only the mesh
//! RUST_LOG=cell_framework=trace cargo run -p chat-rooms
//! ```
//!
//! Log lines carry the cell ids as structured fields, so one conversation can be followed
//! across cells:
//!
//! ```text
//! INFO User joined user=user:bart room=room:school:cafeteria
//! INFO Message censored cell=room:school:cafeteria:censor user="user:bart" word="hell" warnings=1
//! INFO Session closed user=user:bart
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Cell ids identify the source; module paths add nothing
        .compact()
        .init();
}
