pub mod handlers;
pub mod jobs;
pub mod listings;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
