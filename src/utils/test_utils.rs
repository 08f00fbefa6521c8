use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::chat_stream::{ChatGateway, CompletionRequest, GatewayError, StreamMessage};
use crate::core::config::data::Config;
use crate::core::config::Preferences;
use crate::core::persona::PersonaAssets;
use crate::core::server::{ServerControl, ServerControlError};
use crate::ui::console::InputSource;

pub fn create_test_assets() -> PersonaAssets {
    PersonaAssets {
        persona: "luna".to_string(),
        model_id: "luna-test-model".to_string(),
        system_prompt: "You are Luna.".to_string(),
        user_init: "Introduce yourself.".to_string(),
        user_reset: "New chat. Say hello!".to_string(),
        init_mod_message: "Keep it short.".to_string(),
        header: "== Luna ==".to_string(),
    }
}

pub fn create_test_preferences() -> Preferences {
    Config::default().resolve(&Default::default(), std::path::Path::new("/test/config"))
}

/// In-memory writer whose contents stay readable after it is boxed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Contents with ANSI escape sequences removed.
    pub fn plain_text(&self) -> String {
        let raw = self.contents();
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                if chars.next() == Some('[') {
                    for c in chars.by_ref() {
                        if c.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
                continue;
            }
            out.push(c);
        }
        out
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Plays back one scripted stream per request and records every request.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    scripts: Arc<Mutex<VecDeque<Vec<StreamMessage>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A successful reply delivered as the given chunks.
    pub fn reply(self, chunks: &[&str]) -> Self {
        let mut script: Vec<StreamMessage> = chunks
            .iter()
            .map(|chunk| StreamMessage::Chunk(chunk.to_string()))
            .collect();
        script.push(StreamMessage::End);
        self.script(script)
    }

    /// Some chunks, then a failure.
    pub fn failure(self, chunks: &[&str], error: GatewayError) -> Self {
        let mut script: Vec<StreamMessage> = chunks
            .iter()
            .map(|chunk| StreamMessage::Chunk(chunk.to_string()))
            .collect();
        script.push(StreamMessage::Error(error));
        script.push(StreamMessage::End);
        self.script(script)
    }

    pub fn script(self, messages: Vec<StreamMessage>) -> Self {
        self.scripts.lock().unwrap().push_back(messages);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatGateway for ScriptedGateway {
    fn open_stream(&self, request: CompletionRequest) -> mpsc::UnboundedReceiver<StreamMessage> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = mpsc::unbounded_channel();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![StreamMessage::End]);
        for message in script {
            let _ = tx.send(message);
        }
        rx
    }
}

/// Hands out the given lines, then end of input.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    reads: Arc<Mutex<usize>>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            reads: Arc::default(),
        }
    }

    pub fn read_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.reads)
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.lines.pop_front())
    }
}

/// Records server control calls; optionally fails every call.
#[derive(Clone, Default)]
pub struct RecordingServer {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingServer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ServerControlError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail {
            Err(ServerControlError::Failed {
                command: call,
                code: Some(1),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ServerControl for RecordingServer {
    async fn start_server(&mut self) -> Result<(), ServerControlError> {
        self.record("server start".to_string())
    }

    async fn load_model(&mut self, model: &str) -> Result<(), ServerControlError> {
        self.record(format!("load {model}"))
    }

    async fn unload_model(&mut self, model: &str) -> Result<(), ServerControlError> {
        self.record(format!("unload {model}"))
    }

    async fn stop_server(&mut self) -> Result<(), ServerControlError> {
        self.record("server stop".to_string())
    }
}
