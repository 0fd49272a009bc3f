//! Tests for the clique-building passes.
//!
//! - `helpers` - synthetic stores and partition assertions
//! - `partition_tests` - partition and centroid invariants, tau behavior
//! - `mode_tests` - exact vs. approximate divergence and the worked example

mod helpers;
