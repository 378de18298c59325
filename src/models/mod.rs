//! Domain model module declarations.

pub mod chunk;
pub mod session;
