//! Route handlers

pub mod traffic;
