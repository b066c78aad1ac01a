//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on
//! `bgg-collection-workspace` and enable `desktop-shims` without wiring
//! `core-service` and `bridge-desktop` themselves.
