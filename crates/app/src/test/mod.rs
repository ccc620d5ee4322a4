//! Service test harness

mod helpers;

pub(crate) use context::TestContext;
