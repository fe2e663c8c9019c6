//! SnapshotService integration tests.
//!
//! Drive the cache-or-render decision with an in-memory store that counts
//! backend calls and a scripted renderer that counts renders.

#[path = "../support/mod.rs"]
mod support;

mod concurrency;
