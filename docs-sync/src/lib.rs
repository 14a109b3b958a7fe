pub mod cli;
pub mod client;
pub mod load_config;
pub mod rdme;

pub use cli::{run, Cli};
