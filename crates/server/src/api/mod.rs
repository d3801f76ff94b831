pub mod approve;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod records;
pub mod routes;

pub use routes::create_router;
