pub mod config;
pub mod config_loader;
pub mod error;
pub mod retry;
pub mod tag;
pub mod traits;

pub use config::*;
pub use config_loader::{CONFIG_FILENAME, ConfigLoadOptions, ConfigLoader};
pub use error::*;
pub use retry::*;
pub use tag::*;
pub use traits::*;
