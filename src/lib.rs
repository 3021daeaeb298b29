//! docharvest - collect web pages as versioned Markdown documents.
//!
//! Sources are fetched over plain HTTP or through a headless browser, their
//! main content is extracted and converted to Markdown, and every change is
//! kept as a new document version.

pub mod cli;
pub mod collector;
pub mod config;
pub mod converter;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod store;
pub mod utils;
