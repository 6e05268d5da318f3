//! mailvoice: console host for the voice command engine
//!
//! Typed lines stand in for recognized speech and replies are printed:
//! - registers the email-client command set
//! - runs the controller loop on its own task
//! - logs every engine event until stdin closes or Ctrl-C

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mailvoice::commands::{CommandRegistry, CommandSpec};
use mailvoice::platform::{ConsoleRecognizer, ConsoleSynthesizer};
use mailvoice::{normalize_spoken_email, Config, ControllerHandle, EngineEvent, VoiceController};

const FOLDERS: [&str; 5] = ["inbox", "sent", "drafts", "starred", "trash"];
const UNRECOGNIZED_REPLY: &str = "I didn't understand that. Say 'help' for commands.";

#[tokio::main]
async fn main() -> Result<()> {
    // Replies go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "mailvoice starting");

    let config = Config::load().context("invalid configuration")?;
    info!(?config, "configuration loaded");

    // Platform callbacks -> controller, one channel per capability
    let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
    let (synthesis_tx, synthesis_rx) = mpsc::unbounded_channel();
    // Controller -> subscribers
    let (event_tx, _event_rx) = broadcast::channel::<EngineEvent>(64);

    let (handle, control_rx) = ControllerHandle::channel();
    let registry = mail_commands(&handle).context("failed to compile commands")?;

    let recognizer = ConsoleRecognizer::new(recognition_tx);
    let stdin_pump = recognizer.pump_stdin();
    let synthesizer = ConsoleSynthesizer::new(synthesis_tx);

    let controller = VoiceController::new(
        &config,
        Some(Box::new(recognizer)),
        Some(Box::new(synthesizer)),
        registry,
        event_tx.clone(),
    );
    let mut event_rx = event_tx.subscribe();

    if !config.auto_start {
        handle.start_listening();
    }
    handle.speak("Voice assistant activated. Say help for available commands.");

    let controller_task = tokio::spawn(controller.run(recognition_rx, synthesis_rx, control_rx));

    info!("mailvoice ready, type commands");

    tokio::select! {
        result = stdin_pump => {
            if let Err(e) = result {
                error!(?e, "failed to read stdin");
            }
        }

        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => info!(%event, "engine event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "engine event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("engine event stream closed");
        }

        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    handle.shutdown();
    let status = controller_task.await.context("controller task failed")?;

    info!(status = %serde_json::to_string(&status)?, "mailvoice stopped");

    Ok(())
}

/// Command set for the email client, most specific phrasing first
fn mail_commands(handle: &ControllerHandle) -> Result<CommandRegistry> {
    let mut specs = Vec::new();

    for folder in FOLDERS {
        let reply = handle.clone();
        specs.push(CommandSpec::new(
            [
                format!("open {folder}"),
                format!("go to {folder}"),
                format!("show {folder}"),
            ],
            format!("Open {folder}"),
            move |_: &str, _: &[String]| {
                reply.speak(format!("Opening {folder}."));
            },
        ));
    }

    let reply = handle.clone();
    specs.push(CommandSpec::new(
        [r"read email (\d+)", r"open email (\d+)", r"email (\d+)"],
        "Read email by number",
        move |transcript: &str, captures: &[String]| {
            match captures.first().and_then(|n| n.parse::<usize>().ok()) {
                Some(number) if number > 0 => {
                    reply.speak(format!("Opening email {number}."));
                }
                _ => {
                    warn!(transcript, ?captures, "email number not understood");
                    reply.speak(UNRECOGNIZED_REPLY);
                }
            }
        },
    ));

    let reply = handle.clone();
    specs.push(CommandSpec::new(
        [r"(?:compose|write|send) (?:an? )?(?:email|message) to (.+)"],
        "Compose an email",
        move |_: &str, captures: &[String]| {
            let address = captures.first().map(|a| normalize_spoken_email(a)).unwrap_or_default();
            reply.speak(format!("Composing a message to {address}."));
        },
    ));

    let reply = handle.clone();
    specs.push(CommandSpec::new(
        ["stop listening", "go to sleep"],
        "Stop listening",
        move |_: &str, _: &[String]| {
            reply.speak("Voice control paused.");
            reply.stop_listening();
        },
    ));

    let reply = handle.clone();
    specs.push(CommandSpec::new(
        ["^(?:stop|quiet|be quiet|cancel)$"],
        "Stop talking",
        move |_: &str, _: &[String]| {
            reply.cancel_speech();
        },
    ));

    let reply = handle.clone();
    specs.push(CommandSpec::new(
        ["logout", "log out", "sign out"],
        "Logout",
        move |_: &str, _: &[String]| {
            reply.speak("Signing out.");
        },
    ));

    let mut described: Vec<String> = specs.iter().map(|s| s.description.clone()).collect();
    described.push("Show help".to_string());
    let reply = handle.clone();
    specs.push(CommandSpec::new(
        ["help", "what can you do", "commands"],
        "Show help",
        move |_: &str, _: &[String]| {
            reply.speak(format!("Available commands: {}.", described.join(", ")));
        },
    ));

    let reply = handle.clone();
    let registry = CommandRegistry::new(specs)?.with_unrecognized(move |_| {
        reply.speak(UNRECOGNIZED_REPLY);
    });

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailvoice::controller::ControlRequest;

    fn replies_to(transcript: &str) -> Vec<ControlRequest> {
        let (handle, mut control_rx) = ControllerHandle::channel();
        let registry = mail_commands(&handle).unwrap();
        registry.dispatch(transcript);
        let mut requests = Vec::new();
        while let Ok(request) = control_rx.try_recv() {
            requests.push(request);
        }
        requests
    }

    #[test]
    fn test_read_email_by_spoken_number() {
        assert_eq!(
            replies_to("read email three"),
            vec![ControlRequest::Speak("Opening email 3.".to_string())]
        );
    }

    #[test]
    fn test_unusable_email_number_gets_unrecognized_reply() {
        let expected = vec![ControlRequest::Speak(UNRECOGNIZED_REPLY.to_string())];
        assert_eq!(replies_to("read email 0"), expected);
        assert_eq!(replies_to("read email 99999999999999999999999"), expected);
    }

    #[test]
    fn test_compose_normalizes_address() {
        assert_eq!(
            replies_to("compose email to jane at example dot com"),
            vec![ControlRequest::Speak(
                "Composing a message to jane@example.com.".to_string()
            )]
        );
    }
}
