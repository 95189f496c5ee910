//! Text rendering of session snapshots.

use std::io::{self, Write};

use lantern_ai::session::GENERATION_FAILED_MESSAGE;
use lantern_ai::{InitFailure, LifecycleState, Message, Role, SessionSnapshot};

fn role_label(message: &Message) -> &'static str {
    match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// One-line summary for `/status`.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let state = match snapshot.lifecycle {
        LifecycleState::Uninitialized => "not loaded".to_string(),
        LifecycleState::Loading if snapshot.progress_text.is_empty() => "loading".to_string(),
        LifecycleState::Loading => format!("loading ({})", snapshot.progress_text),
        LifecycleState::Ready if snapshot.generating => "ready, generating".to_string(),
        LifecycleState::Ready => "ready".to_string(),
        LifecycleState::Error => match snapshot.error {
            Some(ref failure) => format!("error: {failure}"),
            None => "error".to_string(),
        },
    };
    let turns = snapshot
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .count();
    format!("[{state}] {turns} turns")
}

pub fn write_history(out: &mut impl Write, messages: &[Message]) -> io::Result<()> {
    if messages.is_empty() {
        return writeln!(out, "(no messages yet)");
    }
    for message in messages {
        writeln!(out, "{}> {}", role_label(message), message.content)?;
    }
    Ok(())
}

/// The parts of a snapshot the lifecycle follower compares.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleView {
    pub lifecycle: LifecycleState,
    pub progress_text: String,
    pub error: Option<InitFailure>,
}

impl LifecycleView {
    pub fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            lifecycle: snapshot.lifecycle,
            progress_text: snapshot.progress_text.clone(),
            error: snapshot.error.clone(),
        }
    }
}

/// What to print when the lifecycle moves between two views.
pub fn lifecycle_notice(previous: &LifecycleView, next: &LifecycleView) -> Option<String> {
    match next.lifecycle {
        LifecycleState::Loading
            if !next.progress_text.is_empty()
                && (previous.lifecycle != LifecycleState::Loading
                    || previous.progress_text != next.progress_text) =>
        {
            Some(format!("... {}", next.progress_text))
        }
        LifecycleState::Ready if previous.lifecycle != LifecycleState::Ready => {
            Some("Model ready. Ask away.".to_string())
        }
        LifecycleState::Error if previous.lifecycle != LifecycleState::Error => {
            let reason = next
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            Some(format!("{reason} (type /retry to try again)"))
        }
        _ => None,
    }
}

/// Prints one assistant reply incrementally as snapshots arrive.
///
/// Tracks how much of the reply turn has already been written so each
/// update prints only the new suffix.
pub struct ReplyPrinter {
    reply_index: usize,
    printed: usize,
    started: bool,
    extra_turns: usize,
}

impl ReplyPrinter {
    /// `user_index` is where the user turn of this exchange lands.
    pub fn new(user_index: usize) -> Self {
        Self {
            reply_index: user_index + 1,
            printed: 0,
            started: false,
            extra_turns: 0,
        }
    }

    pub fn update(&mut self, out: &mut impl Write, snapshot: &SessionSnapshot) -> io::Result<()> {
        match self.take_new_text(snapshot) {
            Some(text) => self.write_text(out, &text),
            None => Ok(()),
        }
    }

    /// Copy out the part of the reply not printed yet.
    pub fn take_new_text(&mut self, snapshot: &SessionSnapshot) -> Option<String> {
        let reply = snapshot.messages.get(self.reply_index)?;
        let tail = reply.content.get(self.printed..).filter(|t| !t.is_empty())?;
        let tail = tail.to_string();
        self.printed = reply.content.len();
        Some(tail)
    }

    pub fn write_text(&mut self, out: &mut impl Write, text: &str) -> io::Result<()> {
        if !self.started {
            write!(out, "assistant> ")?;
            self.started = true;
        }
        write!(out, "{text}")?;
        out.flush()
    }

    /// Print whatever the final snapshot adds, including a failure turn
    /// appended after partial output.
    pub fn finish(&mut self, out: &mut impl Write, snapshot: &SessionSnapshot) -> io::Result<()> {
        let failed_outright = !self.started
            && snapshot
                .messages
                .get(self.reply_index)
                .is_some_and(|reply| reply.content == GENERATION_FAILED_MESSAGE);
        if failed_outright {
            writeln!(out, "! {GENERATION_FAILED_MESSAGE}")?;
            self.printed = GENERATION_FAILED_MESSAGE.len();
        } else {
            self.update(out, snapshot)?;
            if self.started {
                writeln!(out)?;
            }
        }

        let following = snapshot.messages.iter().skip(self.reply_index + 1);
        for message in following.skip(self.extra_turns) {
            if message.content == GENERATION_FAILED_MESSAGE {
                writeln!(out, "! {}", message.content)?;
            } else {
                writeln!(out, "{}> {}", role_label(message), message.content)?;
            }
            self.extra_turns += 1;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lifecycle: LifecycleState, messages: Vec<Message>) -> SessionSnapshot {
        SessionSnapshot {
            lifecycle,
            progress_text: String::new(),
            messages,
            generating: false,
            error: None,
        }
    }

    #[test]
    fn status_counts_visible_turns() {
        let snap = snapshot(
            LifecycleState::Ready,
            vec![
                Message::system("be nice"),
                Message::user("hi"),
                Message::assistant("hello"),
            ],
        );
        assert_eq!(status_line(&snap), "[ready] 2 turns");
    }

    #[test]
    fn status_shows_classified_error() {
        let mut snap = snapshot(LifecycleState::Error, vec![]);
        snap.error = Some(InitFailure::UnsupportedPlatform);
        assert_eq!(
            status_line(&snap),
            "[error: WebGPU not supported. Try using Chrome or Edge.] 0 turns"
        );
    }

    #[test]
    fn notices_on_transitions_only() {
        let idle = LifecycleView::of(&snapshot(LifecycleState::Uninitialized, vec![]));
        let mut loading = LifecycleView::of(&snapshot(LifecycleState::Loading, vec![]));
        loading.progress_text = "Fetching model list".into();
        let ready = LifecycleView::of(&snapshot(LifecycleState::Ready, vec![]));

        assert_eq!(
            lifecycle_notice(&idle, &loading).as_deref(),
            Some("... Fetching model list")
        );
        assert_eq!(lifecycle_notice(&loading, &loading), None);
        assert_eq!(
            lifecycle_notice(&loading, &ready).as_deref(),
            Some("Model ready. Ask away.")
        );
        assert_eq!(lifecycle_notice(&ready, &ready), None);
    }

    #[test]
    fn error_notice_mentions_retry() {
        let loading = LifecycleView::of(&snapshot(LifecycleState::Loading, vec![]));
        let mut failed = LifecycleView::of(&snapshot(LifecycleState::Error, vec![]));
        failed.error = Some(InitFailure::NetworkOrCache);
        let notice = lifecycle_notice(&loading, &failed).unwrap();
        assert!(notice.starts_with("Network error downloading model."));
        assert!(notice.ends_with("(type /retry to try again)"));
    }

    #[test]
    fn reply_printer_writes_only_new_text() {
        let mut out = Vec::new();
        let mut printer = ReplyPrinter::new(0);
        let user = Message::user("hi");

        let mut snap = snapshot(
            LifecycleState::Ready,
            vec![user.clone(), Message::assistant("")],
        );
        snap.generating = true;
        printer.update(&mut out, &snap).unwrap();
        snap.messages[1].content = "Hel".into();
        printer.update(&mut out, &snap).unwrap();
        snap.messages[1].content = "Hello!".into();
        snap.generating = false;
        printer.finish(&mut out, &snap).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "assistant> Hello!\n");
    }

    #[test]
    fn reply_printer_shows_failure_after_partial_text() {
        let mut out = Vec::new();
        let mut printer = ReplyPrinter::new(0);
        let snap = snapshot(
            LifecycleState::Ready,
            vec![
                Message::user("hi"),
                Message::assistant("Par"),
                Message::assistant(GENERATION_FAILED_MESSAGE),
            ],
        );
        printer.finish(&mut out, &snap).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("assistant> Par\n! {GENERATION_FAILED_MESSAGE}\n")
        );
    }

    #[test]
    fn history_lists_roles() {
        let mut out = Vec::new();
        write_history(&mut out, &[Message::user("a"), Message::assistant("b")]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "you> a\nassistant> b\n");
    }

    #[test]
    fn reply_printer_marks_outright_failure() {
        let mut out = Vec::new();
        let mut printer = ReplyPrinter::new(2);
        let snap = snapshot(
            LifecycleState::Ready,
            vec![
                Message::user("a"),
                Message::assistant("b"),
                Message::user("c"),
                Message::assistant(GENERATION_FAILED_MESSAGE),
            ],
        );
        printer.finish(&mut out, &snap).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("! {GENERATION_FAILED_MESSAGE}\n")
        );
    }

    #[test]
    fn take_new_text_advances_past_printed_text() {
        let mut printer = ReplyPrinter::new(0);
        let mut snap = snapshot(
            LifecycleState::Ready,
            vec![Message::user("hi"), Message::assistant("Hel")],
        );
        assert_eq!(printer.take_new_text(&snap).as_deref(), Some("Hel"));
        assert_eq!(printer.take_new_text(&snap), None);
        snap.messages[1].content.push_str("lo");
        assert_eq!(printer.take_new_text(&snap).as_deref(), Some("lo"));
    }
}
