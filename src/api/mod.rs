//! HTTP 接口层

pub mod middleware;
pub mod services;
