pub mod app;
pub mod config;
pub mod input;
pub mod model;
pub mod player;
pub mod status;
pub mod transport;
pub mod util;
