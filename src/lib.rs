//! Luna is a line-oriented terminal chat client for a locally hosted LM Studio
//! model server.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session: configuration, persona assets, conversation
//!   history, command classification, the session state machine, the turn
//!   controller, streaming completions and model server control.
//! - [`ui`] is the console surface: colored output and line input.
//! - [`api`] defines the chat-completion payloads sent to the server.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which loads
//! configuration, initializes logging and dispatches into [`core::app`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
