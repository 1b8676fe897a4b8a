pub mod app;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod store;
pub mod util;

pub use app::App;
