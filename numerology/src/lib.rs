//! Pythagorean Numerology for Vybe
//!
//! This crate converts identity data (full name, birth date) into the
//! canonical numerology values used to personalize insights:
//!
//! - **Life Path**: all eight digits of the birth date (`YYYYMMDD`)
//! - **Soul Urge**: vowels of the full name (`Y` is always a consonant)
//! - **Expression**: every letter of the full name
//! - **Personality**: consonants of the full name
//! - **Birthday** / **Personal Year**: day-of-month and yearly cycle numbers
//!
//! Every value is produced by [`reduce_to_single_digit_or_master`], the one
//! place where master numbers (11, 22, 33, 44) halt reduction.
//!
//! # Example
//!
//! ```ignore
//! use numerology::{IdentityInput, NumerologyEngine};
//!
//! let identity = IdentityInput::from_parts("Anna Maria", 1990, 11, 2)?;
//! let profile = NumerologyEngine::new().compute_profile(&identity)?;
//! assert_eq!(profile.life_path_number, 5);
//! ```

pub mod cache;
pub mod engine;
pub mod letters;
pub mod reduce;
pub mod types;

// Re-export main types
pub use cache::ProfileCache;
pub use engine::NumerologyEngine;
pub use reduce::{digit_sum, is_master, is_valid_terminal, reduce_to_single_digit_or_master, MASTER_NUMBERS};
pub use types::*;
