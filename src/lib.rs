pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod startup;

pub use config::Config;
pub use error::RequestError;
pub use startup::Panel;
