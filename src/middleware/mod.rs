//! Gateway middleware

pub mod rate_limit;

pub use rate_limit::{RateLimiter, rate_limit_middleware};
