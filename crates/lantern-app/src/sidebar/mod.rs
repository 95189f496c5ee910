//! Terminal rendition of the chat sidebar.
//!
//! Starts engine construction in the background, follows session
//! snapshots to show loading progress and live replies, and reads
//! prompts and slash commands from stdin.

mod command;
mod render;

use std::io::{self, Write};

use lantern_ai::{InferenceSession, LifecycleState, SendRejected, SessionSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use command::{Command, HELP};
use render::{LifecycleView, ReplyPrinter};

/// Run the sidebar until `/quit` or end of input.
pub async fn run(session: InferenceSession) -> lantern_common::Result<()> {
    let follower = tokio::spawn(follow_lifecycle(session.subscribe()));
    let loader = tokio::spawn({
        let session = session.clone();
        async move { session.initialize().await }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Status => println!("{}", render::status_line(&session.snapshot())),
            Command::History => {
                render::write_history(&mut io::stdout().lock(), &session.snapshot().messages)?
            }
            Command::Retry => retry(&session),
            Command::Unknown(name) => println!("unknown command {name}, type /help"),
            Command::Prompt(text) => ask(&session, text).await?,
        }
    }

    loader.abort();
    follower.abort();
    info!(session = %session.id().short(), "sidebar closed");
    Ok(())
}

/// Send one prompt and print the reply as it streams in.
async fn ask(session: &InferenceSession, text: String) -> io::Result<()> {
    let mut rx = session.subscribe();
    let mut printer = ReplyPrinter::new(session.snapshot().messages.len());
    let mut out = io::stdout();

    let send = session.send_message(text);
    tokio::pin!(send);

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            changed = rx.changed() => {
                if changed.is_err() {
                    break (&mut send).await;
                }
                let text = printer.take_new_text(&rx.borrow_and_update());
                if let Some(text) = text {
                    printer.write_text(&mut out, &text)?;
                }
            }
        }
    };

    match outcome {
        Ok(outcome) => {
            printer.finish(&mut out, &session.snapshot())?;
            debug!(?outcome, "turn finished");
        }
        Err(SendRejected::NotReady) => println!("{}", not_ready_hint(&session.snapshot())),
        Err(rejected) => println!("{rejected}"),
    }
    out.flush()
}

fn retry(session: &InferenceSession) {
    let snapshot = session.snapshot();
    if snapshot.lifecycle != LifecycleState::Error {
        println!("nothing to retry {}", render::status_line(&snapshot));
        return;
    }
    let session = session.clone();
    tokio::spawn(async move { session.reset().await });
}

fn not_ready_hint(snapshot: &SessionSnapshot) -> String {
    match snapshot.lifecycle {
        LifecycleState::Loading => "The model is still loading, please wait.".to_string(),
        LifecycleState::Error => match snapshot.error {
            Some(ref failure) => format!("{failure} (type /retry to try again)"),
            None => "The model failed to load. Type /retry to try again.".to_string(),
        },
        _ => "The model is not loaded yet.".to_string(),
    }
}

/// Print loading progress and lifecycle transitions as they happen.
async fn follow_lifecycle(mut rx: watch::Receiver<SessionSnapshot>) {
    let mut previous = LifecycleView::of(&rx.borrow_and_update());
    while rx.changed().await.is_ok() {
        let next = {
            let snapshot = rx.borrow_and_update();
            if snapshot.lifecycle == previous.lifecycle
                && snapshot.progress_text == previous.progress_text
            {
                continue;
            }
            LifecycleView::of(&snapshot)
        };
        if let Some(notice) = render::lifecycle_notice(&previous, &next) {
            println!("{notice}");
        }
        previous = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_while_loading() {
        let snapshot = SessionSnapshot {
            lifecycle: LifecycleState::Loading,
            progress_text: "Fetching model list".into(),
            messages: Vec::new(),
            generating: false,
            error: None,
        };
        assert_eq!(
            not_ready_hint(&snapshot),
            "The model is still loading, please wait."
        );
    }

    #[test]
    fn hint_after_failure_uses_classified_message() {
        let snapshot = SessionSnapshot {
            lifecycle: LifecycleState::Error,
            progress_text: String::new(),
            messages: Vec::new(),
            generating: false,
            error: Some(lantern_ai::InitFailure::Unknown("disk full".into())),
        };
        assert_eq!(
            not_ready_hint(&snapshot),
            "disk full (type /retry to try again)"
        );
    }
}
