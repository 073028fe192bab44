/// Main configuration module.
/// 
/// Re-exports submodules for gameplay, AI opponent and server configuration.
pub mod game;
pub mod ai;
pub mod server;
