pub mod account_handlers;
pub mod auth;
pub mod ctftime;
pub mod db;
pub mod error;
pub mod handlers;
pub mod hetzner;
pub mod routes;
pub mod scoreboard_handlers;
pub mod server;
pub mod state;
pub mod team_handlers;
pub mod vm_handlers;

pub use error::*;
pub use routes::*;
pub use server::*;
pub use state::*;
