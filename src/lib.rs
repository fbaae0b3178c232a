//! Gridshot Server Library
//!
//! A real-time multiplayer first-person shooter rendered as text: the server
//! simulates a shared tile world, raycasts each player's view into a character
//! grid, and streams frames to browser clients over WebSocket at a fixed tick
//! rate. Hit-scan combat is resolved against other players or autonomous bots.

pub mod config;
pub mod game;
pub mod net;
pub mod services;
pub mod util;
