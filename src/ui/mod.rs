//! Console surface for chat sessions.
//!
//! Output is plain streamed text colored by role; input is read one line at a
//! time. [`crate::core`] owns all session logic.

pub mod console;
