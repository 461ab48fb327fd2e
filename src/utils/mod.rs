//! Utility modules for the site builder.

pub mod fs;
