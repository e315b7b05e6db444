pub mod collections;
pub mod handlers;
pub mod posts;
pub mod profiles;
pub mod saved;
pub mod service;

pub use flair_db::projector::ProjectionOutcome;
pub use handlers::HandlerResponse;
pub use service::FlairService;
