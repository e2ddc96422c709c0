//! Synthetic response construction.

mod builder;

pub use builder::SyntheticResponseBuilder;
