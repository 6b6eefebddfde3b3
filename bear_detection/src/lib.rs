mod encode;
mod error;
mod routes;
mod typeface;

pub mod annotate;
pub mod app;
pub mod config;
pub mod detection;
pub mod inference;
pub mod intake;
pub mod pipeline;
pub mod server;
pub mod telemetry;

pub use app::start_app;
pub use error::DetectError;
pub use typeface::Typeface;
