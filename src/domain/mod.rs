//! Domain Layer - Core data structures for the token rotator
//!
//! Pure types with no I/O. External interactions happen through `ports`.
//!
//! - `token`: Token identity, metadata and momentum state
//! - `ranked_index`: Per-chain index ordered by `(score, id)`
//! - `run_state`: Per-chain lifecycle state machine

pub mod token;
pub mod ranked_index;
pub mod run_state;

pub use token::{Token, TokenMetadata};
pub use ranked_index::{IndexError, RankedTokenIndex};
pub use run_state::RunState;
