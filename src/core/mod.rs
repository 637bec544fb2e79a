pub mod channel;
pub mod config;
pub mod engine;
pub mod interpreter;
pub mod log;
pub mod narration;
pub mod session;
pub mod world;
