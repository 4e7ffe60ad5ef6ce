// tests/common/mod.rs

#![allow(dead_code)]

pub use shipit_test_utils::builders;
pub use shipit_test_utils::fake_executor;
pub use shipit_test_utils::{init_tracing, with_timeout};
