pub mod article_tests;
pub mod common;
pub mod sink_tests;
