pub mod config;
pub mod error;
pub mod messages;
pub mod schedule;
pub mod types;

pub use config::{
    DatabaseConfig, HetznerConfig, OAuthConfig, ServerConfig, Settings,
};
pub use error::*;
pub use messages::*;
pub use schedule::*;
pub use types::*;
