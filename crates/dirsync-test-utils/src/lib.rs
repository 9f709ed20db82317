//! Shared test utilities for the dirsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`TestTree`]: a temporary sync root with helpers to lay out files and
//!   folders, pin modification times and assert on contents

pub mod tree;

pub use tree::TestTree;
