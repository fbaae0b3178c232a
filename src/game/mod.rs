pub mod bots;
pub mod combat;
pub mod constants;
pub mod frame;
pub mod map;
pub mod player;
pub mod raycast;
pub mod sprites;
