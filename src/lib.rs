//! Shuffles the children of a marked list container in component files
//! before a static site build renders them, and patches rendered pages
//! afterwards.
//!
//! The entry point is [`core::engine::transform_directory`]. Host build
//! tools drive it through the lifecycle hooks in [`builders::hooks`].
pub mod builders;
pub mod core;
pub mod utils;
