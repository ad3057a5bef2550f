//! Address-to-city resolution.
//!
//! Strips trailing contact lines, tokenizes the address, scores every
//! gazetteer city on seven additive criteria and applies a confidence
//! policy to pick a winner.

pub mod decision;
pub mod lines;
pub mod resolver;
pub mod scoring;
pub mod tokens;
pub mod types;

pub use lines::{classify, is_contact_line, ClassifiedLines};
pub use resolver::{rank_candidates, resolve_in, AddressResolver};
pub use scoring::{ScoreBreakdown, ScoreInputs};
pub use tokens::{tokenize, Tokens};
pub use types::{Resolution, ResolutionError, ScoredCandidate, MIN_ADDRESS_CHARS};
