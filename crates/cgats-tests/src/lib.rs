//! Conformance and property tests for cgats-core
//!
//! The library part holds the synthetic chart corpus; the actual test
//! scenarios live under `tests/`.

pub mod corpus;
