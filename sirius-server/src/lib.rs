// Library exports for sirius-server
// This allows integration tests and workspace crates to use server modules

pub mod api;
pub mod bus;
pub mod config;
pub mod db;
pub mod feed;
pub mod media;
pub mod password;
pub mod profile;
pub mod rate_limit;
pub mod session;
pub mod state;
