//! Banter core library — GroupMe client, response decision engine, outbound
//! composer, member directory, and the poll loop used by the CLI.

pub mod bot;
pub mod compose;
pub mod config;
pub mod content;
pub mod engine;
pub mod groupme;
pub mod init;
pub mod media;
pub mod members;
pub mod random;
pub mod transform;
