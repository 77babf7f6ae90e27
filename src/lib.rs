pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod gmail;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod unsubscribe;
