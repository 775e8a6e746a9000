pub mod error_code;
pub mod health;
mod helpers;
pub mod links;
pub mod redirect;
pub mod types;

pub use error_code::ErrorCode;
pub use health::{AppStartTime, HealthService, health_routes};
pub use helpers::{
    api_result, error_from_shortlink, error_response, json_error_handler, query_error_handler,
    success_response,
};
pub use links::links_routes;
pub use redirect::{RedirectService, redirect_routes};
pub use types::*;
