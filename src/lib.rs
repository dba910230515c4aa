//! Bookstore application library
//!
//! Holds the application modules mounted by the `bookstore` binary.

pub mod modules;

pub use modules::*;
