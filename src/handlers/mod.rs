// handlers/mod.rs - HTTP handlers grouped by surface
//
// clubs:  record service routes (reads public, writes need a session)
// auth:   identity provider handshake and session lifecycle
// system: index and health
pub mod auth;
pub mod clubs;
pub mod system;
