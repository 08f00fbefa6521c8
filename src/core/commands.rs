//! Classification of one line of user input.
//!
//! Precedence is exit phrase, then mode command, then blank input, and
//! everything else is a plain message. Matching is case-insensitive and
//! exact on the trimmed line.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeSetting {
    pub temperature: f32,
    pub label: &'static str,
}

impl ModeSetting {
    pub fn command(&self) -> String {
        format!("mode:{}", self.label)
    }
}

impl Default for ModeSetting {
    fn default() -> Self {
        STANDARD_MODE
    }
}

const STANDARD_MODE: ModeSetting = ModeSetting {
    temperature: 0.80,
    label: "standard",
};

pub struct ModeCommand {
    pub key: &'static str,
    pub setting: ModeSetting,
}

const MODE_COMMANDS: &[ModeCommand] = &[
    ModeCommand {
        key: "mode:factual",
        setting: ModeSetting {
            temperature: 0.30,
            label: "factual",
        },
    },
    ModeCommand {
        key: "mode:rational",
        setting: ModeSetting {
            temperature: 0.50,
            label: "rational",
        },
    },
    ModeCommand {
        key: "mode:standard",
        setting: STANDARD_MODE,
    },
    ModeCommand {
        key: "mode:conversational",
        setting: ModeSetting {
            temperature: 0.95,
            label: "conversational",
        },
    },
    ModeCommand {
        key: "mode:imaginative",
        setting: ModeSetting {
            temperature: 1.30,
            label: "imaginative",
        },
    },
    ModeCommand {
        key: "mode:verbose",
        setting: ModeSetting {
            temperature: 1.65,
            label: "verbose",
        },
    },
];

const GLOBAL_EXIT_PHRASES: &[&str] = &["quit", "exit", "stop", "qqq", "goodbye"];

pub fn all_modes() -> &'static [ModeCommand] {
    MODE_COMMANDS
}

pub fn find_mode(key: &str) -> Option<ModeSetting> {
    MODE_COMMANDS
        .iter()
        .find(|command| command.key.eq_ignore_ascii_case(key))
        .map(|command| command.setting)
}

pub fn find_mode_by_label(label: &str) -> Option<ModeSetting> {
    MODE_COMMANDS
        .iter()
        .find(|command| command.setting.label.eq_ignore_ascii_case(label))
        .map(|command| command.setting)
}

/// The exit phrases for `persona`, lowercased.
pub fn exit_phrases(persona: &str) -> Vec<String> {
    let persona = persona.trim().to_lowercase();
    let mut phrases = vec![
        format!("{persona}:quit"),
        format!("{persona}:exit"),
        format!("{persona}:stop"),
        format!("bye, {persona}!"),
        format!("later, {persona}."),
    ];
    phrases.extend(GLOBAL_EXIT_PHRASES.iter().map(|phrase| phrase.to_string()));
    phrases
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    ExitRequested,
    ModeChange(ModeSetting),
    ContinuationRequest,
    PlainMessage(String),
}

pub fn classify(input: &str, persona: &str) -> InputCommand {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    if exit_phrases(persona).iter().any(|phrase| *phrase == lowered) {
        return InputCommand::ExitRequested;
    }

    if let Some(setting) = find_mode(&lowered) {
        return InputCommand::ModeChange(setting);
    }

    if trimmed.is_empty() {
        return InputCommand::ContinuationRequest;
    }

    InputCommand::PlainMessage(input.to_string())
}
