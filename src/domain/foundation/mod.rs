//! Foundational value objects shared across the domain.

mod identity;

pub use identity::Identity;
