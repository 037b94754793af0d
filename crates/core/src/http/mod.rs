//! Transport-neutral HTTP model and the middleware pipeline

pub mod message;
pub mod pipeline;

pub use message::{ApiRequest, ApiResponse, HttpMethod, AUTHORIZATION};
pub use pipeline::{Middleware, Next, Pipeline, Transport};
