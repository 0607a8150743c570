//! Demo wiring for the `libris` binary: a seeded catalog and a toy content
//! delivery collaborator.

pub mod delivery;
pub mod seed;
