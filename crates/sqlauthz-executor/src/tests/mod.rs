//! Unit tests that need crate-private items.

mod exec_context_tests;
