//! Session recording core: registry, chunk feed, and finalization.

pub mod feed;
pub mod finalize;
pub mod registry;
pub mod session;
