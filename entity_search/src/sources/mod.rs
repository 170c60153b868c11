//! Per-source search implementations. Each source exposes a single
//! `search` function scanning its fields and returning every hit, at most
//! one per section path (the best strategy per field wins).

pub mod character;
pub mod rulebook;
pub mod session;
