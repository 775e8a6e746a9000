//! 业务服务层，HTTP 层只负责协议转换

pub mod link_service;
mod requester;
pub mod resolver;

pub use link_service::{CreateLinkRequest, LinkService, UpdateLinkRequest};
pub use requester::Requester;
pub use resolver::{LinkInfo, NotFoundReason, Resolution, Resolver};
