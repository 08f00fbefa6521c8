//! Line-oriented terminal surface: colored output on stdout, one input line
//! per turn from stdin.

use std::io::{self, Write};

use async_trait::async_trait;
use ratatui::crossterm::cursor::MoveTo;
use ratatui::crossterm::queue;
use ratatui::crossterm::style::Color;
use ratatui::crossterm::terminal::{Clear, ClearType, SetSize};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::utils::color::{fg_sequence, reset_sequence};

pub const PROMPT: &str = ">> ";
pub const FAREWELL: &str = " *** Goodbye! ***";

const ASSISTANT: Color = Color::Cyan;
const USER: Color = Color::Magenta;
const ECHO: Color = Color::White;
const WARNING: Color = Color::Yellow;
const ERROR: Color = Color::Red;
const DEBUG: Color = Color::DarkGrey;

pub struct Console {
    out: Box<dyn Write + Send>,
    debug: bool,
}

impl Console {
    pub fn new(out: Box<dyn Write + Send>, debug: bool) -> Self {
        Self { out, debug }
    }

    pub fn stdout(debug: bool) -> Self {
        Self::new(Box::new(io::stdout()), debug)
    }

    fn colored(&mut self, color: Color, text: &str, newline: bool) -> io::Result<()> {
        write!(self.out, "{}{}{}", fg_sequence(color), text, reset_sequence())?;
        if newline {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    /// One streamed fragment of the assistant's reply.
    pub fn assistant_chunk(&mut self, text: &str) -> io::Result<()> {
        self.colored(ASSISTANT, text, false)
    }

    /// Terminates the streamed reply line.
    pub fn end_reply(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Input prompt. The color stays on so the typed line is shown in the
    /// user color; [`Console::end_input`] resets it.
    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "{}{}", fg_sequence(USER), PROMPT)?;
        self.out.flush()
    }

    pub fn end_input(&mut self) -> io::Result<()> {
        write!(self.out, "{}", reset_sequence())?;
        self.out.flush()
    }

    pub fn echo(&mut self, text: &str) -> io::Result<()> {
        self.colored(ECHO, text, true)
    }

    pub fn status(&mut self, color: Color, text: &str) -> io::Result<()> {
        self.colored(color, text, true)
    }

    pub fn warning(&mut self, text: &str) -> io::Result<()> {
        self.colored(WARNING, text, true)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.colored(ERROR, text, true)
    }

    /// Shown only in debug mode.
    pub fn debug_note(&mut self, text: &str) -> io::Result<()> {
        if self.debug {
            self.colored(DEBUG, text, true)
        } else {
            Ok(())
        }
    }

    /// Already-rendered persona header; it carries its own colors.
    pub fn header(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}{}", text, reset_sequence())?;
        self.out.flush()
    }

    pub fn farewell(&mut self) -> io::Result<()> {
        writeln!(self.out, "{FAREWELL}")?;
        self.out.flush()
    }

    pub fn clear(&mut self, enabled: bool) -> io::Result<()> {
        if !enabled {
            return self.debug_note("A console clear was refused due to user preference.");
        }
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        self.debug_note("The console was cleared.")
    }

    pub fn resize(&mut self, enabled: bool, cols: u16, lines: u16) -> io::Result<()> {
        if !enabled {
            return self.debug_note("A console resize was refused due to user preference.");
        }
        queue!(self.out, SetSize(cols, lines))?;
        self.out.flush()
    }
}

/// Where the session reads user input from. `Ok(None)` is end of input.
#[async_trait]
pub trait InputSource: Send {
    async fn read_line(&mut self) -> io::Result<Option<String>>;
}

pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}
