pub mod app;
pub mod config;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod responses;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod uploads;

pub use app::router;
pub use config::Config;
pub use state::AppState;
