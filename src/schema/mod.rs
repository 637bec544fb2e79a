pub mod message;
pub mod player;
pub mod room;
