//! Go-Short-Link - short-link redirection service
//!
//! # Architecture
//! - `generator`: random short code generation with collision retry
//! - `storage`: the authoritative code -> target mapping store (SeaORM)
//! - `cache`: read-through object cache plus negative cache
//! - `services`: resolution engine and link ingestion
//! - `hits`: buffered hit counting
//! - `api`: HTTP handlers and middleware
//! - `runtime`: startup, server mode and graceful shutdown

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod generator;
pub mod hits;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
