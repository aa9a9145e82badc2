//! Support utilities shared by the explorer implementations.

pub mod logger;
