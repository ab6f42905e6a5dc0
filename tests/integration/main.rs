//! Integration test harness

mod crawl_tests;
mod workflow_tests;
