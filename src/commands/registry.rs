//! Command registry and first-match dispatch
//!
//! Patterns are compiled once, case-insensitively, when the registry is
//! built. Dispatch walks commands in registration order and each command's
//! patterns in declaration order; the first pattern that matches wins and
//! nothing after it is evaluated.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::normalize::normalize_spoken_numbers;

/// Action invoked with the full matched transcript and the captured groups
pub type CommandAction = Box<dyn Fn(&str, &[String]) + Send + Sync>;

/// Callback for final transcripts no command matched
pub type UnrecognizedHandler = Box<dyn Fn(&str) + Send + Sync>;

/// A command as supplied by the caller
pub struct CommandSpec {
    pub patterns: Vec<String>,
    pub action: CommandAction,
    pub description: String,
}

impl CommandSpec {
    pub fn new<P, S, F>(patterns: P, description: impl Into<String>, action: F) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&str, &[String]) + Send + Sync + 'static,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            action: Box::new(action),
            description: description.into(),
        }
    }
}

struct Command {
    patterns: Vec<Regex>,
    action: CommandAction,
    description: String,
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMatch {
    /// Source of the pattern that matched
    pub pattern: String,
    pub description: String,
    /// Capture groups in order; groups that did not participate are empty
    pub captures: Vec<String>,
}

/// What dispatching one final transcript did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Matched {
        transcript: String,
        command: CommandMatch,
    },
    Unrecognized {
        transcript: String,
    },
}

impl DispatchOutcome {
    /// Normalized transcript the outcome was computed from
    pub fn transcript(&self) -> &str {
        match self {
            Self::Matched { transcript, .. } | Self::Unrecognized { transcript } => transcript,
        }
    }
}

/// Immutable, compiled command registry
pub struct CommandRegistry {
    commands: Vec<Command>,
    on_unrecognized: Option<UnrecognizedHandler>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.descriptions())
            .field("has_unrecognized_handler", &self.on_unrecognized.is_some())
            .finish()
    }
}

impl CommandRegistry {
    /// Compile every pattern, rejecting the registry if any is malformed
    pub fn new(specs: Vec<CommandSpec>) -> Result<Self, RegistryError> {
        let mut commands = Vec::with_capacity(specs.len());

        for spec in specs {
            if spec.patterns.is_empty() {
                return Err(RegistryError::NoPatterns {
                    command: spec.description,
                });
            }

            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for source in &spec.patterns {
                let regex = RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source_err| RegistryError::InvalidPattern {
                        command: spec.description.clone(),
                        pattern: source.clone(),
                        source: source_err,
                    })?;
                patterns.push(regex);
            }

            commands.push(Command {
                patterns,
                action: spec.action,
                description: spec.description,
            });
        }

        info!(commands = commands.len(), "command registry compiled");
        Ok(Self {
            commands,
            on_unrecognized: None,
        })
    }

    /// Install the callback for transcripts no command matches
    pub fn with_unrecognized<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_unrecognized = Some(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command descriptions in registration order
    pub fn descriptions(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.description.as_str()).collect()
    }

    /// Find the first matching pattern without running any action
    pub fn find(&self, normalized: &str) -> Option<(usize, CommandMatch)> {
        for (index, command) in self.commands.iter().enumerate() {
            for pattern in &command.patterns {
                let Some(caps) = pattern.captures(normalized) else {
                    continue;
                };
                let captures = caps
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return Some((
                    index,
                    CommandMatch {
                        pattern: pattern.as_str().to_string(),
                        description: command.description.clone(),
                        captures,
                    },
                ));
            }
        }
        None
    }

    /// Normalize a final transcript and run the first matching command
    pub fn dispatch(&self, transcript: &str) -> DispatchOutcome {
        let normalized = normalize_spoken_numbers(transcript.trim());

        match self.find(&normalized) {
            Some((index, command_match)) => {
                info!(
                    pattern = %command_match.pattern,
                    command = %command_match.description,
                    captures = ?command_match.captures,
                    "command matched"
                );
                (self.commands[index].action)(&normalized, &command_match.captures);
                DispatchOutcome::Matched {
                    transcript: normalized,
                    command: command_match,
                }
            }
            None => {
                debug!(transcript = %normalized, "no command matched");
                if let Some(handler) = &self.on_unrecognized {
                    handler(&normalized);
                }
                DispatchOutcome::Unrecognized {
                    transcript: normalized,
                }
            }
        }
    }
}
