//! Speak command handler.
//!
//! Plays one text and, unless disabled, reads single-letter controls from
//! stdin while it plays: `p` pause, `r` resume, `s`/`q` stop.

use std::path::PathBuf;
use std::time::Duration;

use narrate_core::{DocumentId, PlaybackEvent, PlaybackStatus};
use narrate_voice::PlayOptions;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Arguments for the speak command.
#[derive(Debug, Default)]
pub struct SpeakArgs {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    pub voice: Option<String>,
    pub document: Option<String>,
    pub controls: bool,
}

/// A control typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
    Stop,
}

fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Control::Pause),
        "r" | "resume" => Some(Control::Resume),
        "s" | "stop" | "q" | "quit" => Some(Control::Stop),
        _ => None,
    }
}

/// Execute the speak command.
pub async fn execute(ctx: CliContext, args: SpeakArgs) -> Result<(), CliError> {
    let from_stdin = args.text.is_none() && args.file.is_none();
    let text = read_text(&args).await?;

    let mut options = PlayOptions::default();
    if let Some(voice) = args.voice {
        options = options.with_voice(voice);
    }
    if let Some(document) = args.document {
        options = options.for_document(DocumentId::new(document));
    }

    let CliContext {
        orchestrator,
        events,
        ..
    } = ctx;

    let generation = orchestrator.play(&text, options)?;
    let printer = tokio::spawn(print_events(events));

    let controls = args.controls && !from_stdin;
    if controls {
        println!("Controls: [p]ause  [r]esume  [s]top");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = controls;
    let status = loop {
        tokio::select! {
            status = orchestrator.wait_until_settled(generation) => break status,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_control(&line) {
                    Some(Control::Pause) => orchestrator.pause(),
                    Some(Control::Resume) => orchestrator.resume(),
                    Some(Control::Stop) => orchestrator.stop(),
                    None => println!("Unknown control '{}'", line.trim()),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "Stopped reading controls");
                    stdin_open = false;
                }
            },
        }
    };

    let last_error = orchestrator.snapshot().last_error;
    drop(orchestrator);
    // The printer ends once every session task has let go of the channel.
    if tokio::time::timeout(Duration::from_millis(250), printer)
        .await
        .is_err()
    {
        tracing::debug!("Event printer still running at exit");
    }

    match status {
        PlaybackStatus::Errored => Err(last_error.as_ref().map_or_else(
            || CliError::Playback("unknown error".to_string()),
            CliError::from,
        )),
        PlaybackStatus::Stopped => {
            println!("Stopped.");
            Ok(())
        }
        _ => {
            println!("Done.");
            Ok(())
        }
    }
}

async fn read_text(args: &SpeakArgs) -> Result<String, CliError> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }
    if let Some(ref path) = args.file {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display())));
    }
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

/// Print events until the orchestrator is dropped.
async fn print_events(mut events: mpsc::UnboundedReceiver<PlaybackEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::StateChanged { generation, status } => {
                tracing::debug!(%generation, ?status, "State changed");
            }
            PlaybackEvent::SentenceChanged { index, .. } => {
                println!("  sentence {}", index + 1);
            }
            PlaybackEvent::Progress { progress, .. } => {
                println!("  {}%", progress.percent_complete);
            }
            PlaybackEvent::Failed { error, .. } => {
                eprintln!("  error ({:?}): {}", error.kind, error.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_accept_letters_and_words() {
        assert_eq!(parse_control("p"), Some(Control::Pause));
        assert_eq!(parse_control(" Resume \n"), Some(Control::Resume));
        assert_eq!(parse_control("q"), Some(Control::Stop));
        assert_eq!(parse_control("STOP"), Some(Control::Stop));
        assert_eq!(parse_control("x"), None);
    }

    #[tokio::test]
    async fn text_argument_wins() {
        let args = SpeakArgs {
            text: Some("Hello.".to_string()),
            ..SpeakArgs::default()
        };
        assert_eq!(read_text(&args).await.unwrap(), "Hello.");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let args = SpeakArgs {
            file: Some(PathBuf::from("/nonexistent/narrate/input.txt")),
            ..SpeakArgs::default()
        };
        let err = read_text(&args).await.unwrap_err();
        assert_eq!(err.exit_code(), 74);
    }
}
