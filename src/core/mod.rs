pub mod app;
pub mod chat_stream;
pub mod commands;
pub mod config;
pub mod history;
pub mod message;
pub mod persona;
pub mod server;
pub mod state;
pub mod template;
