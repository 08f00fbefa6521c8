//! Control of the local LM Studio server through the `lms` CLI.

use std::fmt;
use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug)]
pub enum ServerControlError {
    /// The control program could not be started at all.
    Spawn { command: String, source: io::Error },
    /// The control program ran and reported failure.
    Failed { command: String, code: Option<i32> },
}

impl fmt::Display for ServerControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerControlError::Spawn { command, source } => {
                write!(f, "Could not run `{command}`: {source}")
            }
            ServerControlError::Failed {
                command,
                code: Some(code),
            } => write!(f, "`{command}` exited with status {code}"),
            ServerControlError::Failed {
                command,
                code: None,
            } => write!(f, "`{command}` was terminated by a signal"),
        }
    }
}

impl std::error::Error for ServerControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerControlError::Spawn { source, .. } => Some(source),
            ServerControlError::Failed { .. } => None,
        }
    }
}

/// Start/stop the model server and load/unload the model. Failures are
/// reported to the caller, who treats them as warnings.
#[async_trait]
pub trait ServerControl: Send {
    async fn start_server(&mut self) -> Result<(), ServerControlError>;
    async fn load_model(&mut self, model: &str) -> Result<(), ServerControlError>;
    async fn unload_model(&mut self, model: &str) -> Result<(), ServerControlError>;
    async fn stop_server(&mut self) -> Result<(), ServerControlError>;
}

/// Drives LM Studio through its `lms` command-line tool.
pub struct LmsCli {
    program: String,
    gpu_ratio: f32,
    owns_server: bool,
    model_loaded: bool,
}

impl LmsCli {
    pub fn new(program: impl Into<String>, gpu_ratio: f32) -> Self {
        Self {
            program: program.into(),
            gpu_ratio,
            owns_server: false,
            model_loaded: false,
        }
    }

    pub fn owns_server(&self) -> bool {
        self.owns_server
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut command = self.program.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    async fn run(&self, args: &[&str]) -> Result<(), ServerControlError> {
        let command = self.describe(args);
        debug!(%command, "running server control command");

        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| ServerControlError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ServerControlError::Failed {
                command,
                code: status.code(),
            })
        }
    }
}

#[async_trait]
impl ServerControl for LmsCli {
    async fn start_server(&mut self) -> Result<(), ServerControlError> {
        if self.owns_server {
            return Ok(());
        }
        self.run(&["server", "start"]).await?;
        self.owns_server = true;
        Ok(())
    }

    async fn load_model(&mut self, model: &str) -> Result<(), ServerControlError> {
        let gpu = format!("{}", self.gpu_ratio);
        match self.run(&["load", "--gpu", &gpu, model]).await {
            Ok(()) => {
                self.model_loaded = true;
                Ok(())
            }
            Err(err) => {
                self.model_loaded = false;
                Err(err)
            }
        }
    }

    async fn unload_model(&mut self, model: &str) -> Result<(), ServerControlError> {
        if !self.model_loaded {
            return Ok(());
        }
        self.run(&["unload", model]).await?;
        self.model_loaded = false;
        Ok(())
    }

    async fn stop_server(&mut self) -> Result<(), ServerControlError> {
        if !self.owns_server {
            return Ok(());
        }
        self.run(&["server", "stop"]).await?;
        self.owns_server = false;
        Ok(())
    }
}

/// Used when server management is turned off; the server is assumed to be
/// running with the model available.
#[derive(Debug, Default)]
pub struct UnmanagedServer;

#[async_trait]
impl ServerControl for UnmanagedServer {
    async fn start_server(&mut self) -> Result<(), ServerControlError> {
        debug!("server management disabled; not starting server");
        Ok(())
    }

    async fn load_model(&mut self, _model: &str) -> Result<(), ServerControlError> {
        Ok(())
    }

    async fn unload_model(&mut self, _model: &str) -> Result<(), ServerControlError> {
        Ok(())
    }

    async fn stop_server(&mut self) -> Result<(), ServerControlError> {
        Ok(())
    }
}
