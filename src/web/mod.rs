//! Web API module.

pub mod comments;
pub mod daily;
pub mod error;
pub mod intent;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod search;
pub mod status;
pub mod suggest;

pub use routes::*;
