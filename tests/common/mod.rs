//! Shared test utilities

#![allow(unused_imports)]

pub mod fixtures;
pub mod mock_forge;

pub use fixtures::*;
pub use mock_forge::*;
