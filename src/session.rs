// Session module - the interactive edit loop as an explicit state machine
//
// One captured request is processed to completion (parse -> rewrite ->
// optional dispatch) before the next cycle begins. Each state carries the
// value the next stage consumes, so there is no shared mutable record and
// every transition is testable with a scripted prompter and an in-memory
// buffer instead of a real console and clipboard.

use crate::buffer::TextBuffer;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::parser::models::CapturedRequest;
use crate::parser::{looks_like_capture, Extractor};
use crate::rewrite::{rewrite, RewrittenRequest};
use crate::util::preview;
use anyhow::Result;
use std::io::{self, Write};
use std::time::Duration;

const SEPARATOR: &str = "============================================================";

/// Line-oriented console seam so tests can drive the loop without a terminal.
pub trait Prompter {
    /// Print an informational line
    fn info(&mut self, line: &str);
    /// Print a prompt and read one line of input, trimmed
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Stdin/stdout prompter used by the binary.
pub struct StdioPrompter;

impl Prompter for StdioPrompter {
    fn info(&mut self, line: &str) {
        println!("{line}");
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

/// States of the interactive loop.
enum SessionState {
    /// Waiting for a usable capture in the buffer
    AwaitingCapture,
    /// Capture parsed; waiting for replacement content and the message id
    AwaitingEdit(CapturedRequest),
    /// Request rewritten; waiting for the user to pick how to send it
    AwaitingDispatchChoice {
        channel_id: String,
        rewritten: RewrittenRequest,
    },
    Done,
}

/// The interactive session, generic over its I/O seams.
pub struct Session<'a> {
    config: &'a Config,
    extractor: Extractor,
    dispatcher: &'a Dispatcher,
    buffer: &'a mut dyn TextBuffer,
    prompter: &'a mut dyn Prompter,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        dispatcher: &'a Dispatcher,
        buffer: &'a mut dyn TextBuffer,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            config,
            extractor: Extractor::new(),
            dispatcher,
            buffer,
            prompter,
        }
    }

    /// Run edit cycles until the user is done.
    ///
    /// Recoverable problems (bad captures, empty ids, failed dispatches) stay
    /// inside the loop; only I/O faults propagate out, terminating the
    /// program with their diagnostic.
    pub async fn run(&mut self) -> Result<()> {
        let mut state = SessionState::AwaitingCapture;
        loop {
            state = match state {
                SessionState::AwaitingCapture => self.await_capture()?,
                SessionState::AwaitingEdit(captured) => self.await_edit(captured)?,
                SessionState::AwaitingDispatchChoice {
                    channel_id,
                    rewritten,
                } => self.await_dispatch_choice(channel_id, rewritten).await?,
                SessionState::Done => return Ok(()),
            };
        }
    }

    /// Read the buffer until it holds a fetch snippet (bounded attempts),
    /// then extract it.
    fn await_capture(&mut self) -> Result<SessionState> {
        self.prompter.info(SEPARATOR);
        self.prompter
            .ask("Press Enter once the fetch request is in the clipboard... ")?;
        let mut text = self.buffer.read_text()?;

        let mut attempts = 0;
        while !looks_like_capture(&text) && attempts < self.config.max_capture_attempts {
            attempts += 1;
            self.prompter.info("No fetch request found in the clipboard.");
            self.prompter.ask(&format!(
                "Attempt {}/{}. Copy the request from DevTools and press Enter... ",
                attempts, self.config.max_capture_attempts
            ))?;
            text = self.buffer.read_text()?;
        }

        if !looks_like_capture(&text) {
            self.prompter
                .info("Still no fetch request in the clipboard after several attempts.");
            self.prompter
                .info("Make sure you copy the full request (right-click -> Copy as fetch).");
            return self.retry_or_done();
        }

        match self.extractor.extract(&text) {
            Ok(captured) => {
                self.prompter.info("Fetch request read successfully.");
                self.prompter.info(&format!("URL: {}", captured.endpoint));
                self.prompter
                    .info(&format!("Current text: {}", captured.original_content));
                self.prompter
                    .info(&format!("Current id: {}", captured.original_nonce));
                self.prompter.info(SEPARATOR);
                Ok(SessionState::AwaitingEdit(captured))
            }
            Err(e) => {
                tracing::debug!("capture rejected: {e}");
                self.prompter
                    .info(&format!("Could not use the copied request: {e}"));
                self.retry_or_done()
            }
        }
    }

    /// Collect the replacement content and message id, rewrite, and put the
    /// snippet back on the buffer.
    fn await_edit(&mut self, captured: CapturedRequest) -> Result<SessionState> {
        self.prompter
            .info("Enter the replacement text (quotes and backslashes are fine):");
        let new_content = self.prompter.ask("> ")?;
        self.prompter
            .info(&format!("Preview: \"{}\"", preview(&new_content, 200)));

        self.prompter.info("");
        self.prompter
            .info("The EXACT id of the message to edit is required.");
        self.prompter
            .info("Right-click the message -> Copy Message ID.");
        self.prompter
            .info("With a wrong id a new message is created instead of an edit.");
        let new_id = self.prompter.ask("Message id: ")?;

        if new_id.is_empty() {
            self.prompter
                .info("The message id cannot be empty; the edit was aborted.");
            return self.retry_or_done();
        }

        let channel_id = captured.channel_id.clone();
        let rewritten = rewrite(&captured, &new_content, &new_id);

        match self.buffer.write_text(&rewritten.fetch_snippet) {
            Ok(()) => self
                .prompter
                .info("The rewritten fetch request is in the clipboard."),
            Err(e) => {
                tracing::warn!("clipboard write failed: {e}");
                self.prompter
                    .info("Could not write to the clipboard; paste this manually:");
                self.prompter.info(&rewritten.fetch_snippet);
            }
        }

        Ok(SessionState::AwaitingDispatchChoice {
            channel_id,
            rewritten,
        })
    }

    /// Let the user pick between direct dispatch, clipboard-only, and exit.
    async fn await_dispatch_choice(
        &mut self,
        channel_id: String,
        rewritten: RewrittenRequest,
    ) -> Result<SessionState> {
        self.prompter.info("");
        self.prompter.info("How should the edit be sent?");
        self.prompter
            .info("1. Send the request directly from here (recommended)");
        self.prompter
            .info("2. Keep the fetch request in the clipboard only");
        self.prompter.info("3. Exit without sending");
        let choice = self.prompter.ask("> ")?;

        match choice.as_str() {
            "1" => self.dispatch(&channel_id, &rewritten).await,
            "2" => {
                self.prompter
                    .info("Paste the request into the DevTools console (F12) on the Discord tab.");
                self.another_message().await
            }
            "3" => {
                self.prompter.info("Exiting without sending.");
                Ok(SessionState::Done)
            }
            _ => {
                self.prompter.info("Unrecognized choice.");
                self.another_message().await
            }
        }
    }

    async fn dispatch(
        &mut self,
        channel_id: &str,
        rewritten: &RewrittenRequest,
    ) -> Result<SessionState> {
        self.prompter.info("Sending the request...");
        match self.dispatcher.send(&rewritten.payload).await {
            Ok(response) => {
                let message_id = response
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                self.prompter.info("The message was updated.");
                self.prompter.info(&format!("Message id: {message_id}"));
                self.prompter.info(&format!(
                    "Link: https://discord.com/channels/@me/{channel_id}/{message_id}"
                ));
                self.another_message().await
            }
            Err(e) => {
                tracing::debug!("dispatch failed: {e}");
                self.prompter.info(&format!("Sending failed: {e}"));
                self.prompter
                    .info("The fetch request is still in the clipboard for manual replay.");
                self.retry_or_done()
            }
        }
    }

    /// Ask whether to process another message; pause briefly before the next
    /// capture so the user can switch windows.
    async fn another_message(&mut self) -> Result<SessionState> {
        let answer = self.prompter.ask("\nEdit another message? (y/n): ")?;
        if is_yes(&answer) {
            tokio::time::sleep(Duration::from_millis(self.config.cycle_pause_ms)).await;
            Ok(SessionState::AwaitingCapture)
        } else {
            Ok(SessionState::Done)
        }
    }

    fn retry_or_done(&mut self) -> Result<SessionState> {
        let answer = self.prompter.ask("\nTry again with another capture? (y/n): ")?;
        if is_yes(&answer) {
            Ok(SessionState::AwaitingCapture)
        } else {
            Ok(SessionState::Done)
        }
    }
}

/// Anything non-affirmative counts as "no", which keeps every prompt bounded.
fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedPrompter {
        answers: VecDeque<&'static str>,
        transcript: Vec<String>,
        asked: usize,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                transcript: Vec::new(),
                asked: 0,
            }
        }

        fn saw(&self, needle: &str) -> bool {
            self.transcript.iter().any(|line| line.contains(needle))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn info(&mut self, line: &str) {
            self.transcript.push(line.to_string());
        }

        fn ask(&mut self, prompt: &str) -> Result<String> {
            self.transcript.push(prompt.to_string());
            self.asked += 1;
            Ok(self.answers.pop_front().unwrap_or("").to_string())
        }
    }

    struct MemoryBuffer {
        content: String,
        writes: Vec<String>,
    }

    impl MemoryBuffer {
        fn holding(content: &str) -> Self {
            Self {
                content: content.to_string(),
                writes: Vec::new(),
            }
        }
    }

    impl TextBuffer for MemoryBuffer {
        fn read_text(&mut self) -> Result<String> {
            Ok(self.content.clone())
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    const CAPTURE: &str = r#"fetch("https://discord.com/api/v9/channels/123/messages", {"headers": {"authorization": "X"}, "body": "{\"content\":\"hi\",\"nonce\":\"111\"}"})"#;

    fn test_config() -> Config {
        Config {
            cycle_pause_ms: 0,
            ..Config::default()
        }
    }

    async fn run_session(
        config: &Config,
        buffer: &mut MemoryBuffer,
        prompter: &mut ScriptedPrompter,
    ) -> Result<()> {
        let dispatcher = Dispatcher::new(Duration::from_secs(1)).unwrap();
        let mut session = Session::new(config, &dispatcher, buffer, prompter);
        session.run().await
    }

    #[tokio::test]
    async fn empty_id_aborts_before_rewrite() {
        let config = test_config();
        let mut buffer = MemoryBuffer::holding(CAPTURE);
        // Enter at capture prompt, replacement text, empty id, decline retry
        let mut prompter = ScriptedPrompter::new(&["", "bye", "", "n"]);

        run_session(&config, &mut buffer, &mut prompter).await.unwrap();

        assert!(
            buffer.writes.is_empty(),
            "nothing may be rewritten without a message id"
        );
        assert!(prompter.saw("The message id cannot be empty"));
        assert!(prompter.saw("Try again with another capture?"));
    }

    #[tokio::test]
    async fn capture_attempts_are_bounded() {
        let config = test_config();
        let mut buffer = MemoryBuffer::holding("definitely not a fetch snippet");
        // Enter, three re-read attempts, decline retry
        let mut prompter = ScriptedPrompter::new(&["", "", "", "", "n"]);

        run_session(&config, &mut buffer, &mut prompter).await.unwrap();

        // Initial prompt + 3 bounded attempts + the retry question
        assert_eq!(prompter.asked, 5);
        assert!(prompter.saw("Still no fetch request"));
    }

    #[tokio::test]
    async fn copy_only_path_writes_the_rewritten_snippet() {
        let config = test_config();
        let mut buffer = MemoryBuffer::holding(CAPTURE);
        // Enter, content, id, clipboard-only choice, stop
        let mut prompter = ScriptedPrompter::new(&["", "bye", "999", "2", "n"]);

        run_session(&config, &mut buffer, &mut prompter).await.unwrap();

        assert_eq!(buffer.writes.len(), 1);
        let snippet = &buffer.writes[0];
        assert!(snippet.starts_with("fetch(\"https://discord.com/api/v9/channels/123/messages\""));
        assert!(snippet.contains(r#"\"content\":\"bye\""#));
        assert!(snippet.contains(r#"\"nonce\":\"999\""#));
        assert!(prompter.saw("DevTools console"));
    }

    #[tokio::test]
    async fn unusable_capture_reports_and_offers_retry() {
        let config = test_config();
        let mut buffer = MemoryBuffer::holding(
            r#"fetch("https://discord.com/api/v9/guilds/1/members", {"headers": {}, "body": "{\"nonce\":\"1\"}"})"#,
        );
        let mut prompter = ScriptedPrompter::new(&["", "n"]);

        run_session(&config, &mut buffer, &mut prompter).await.unwrap();

        assert!(prompter.saw("Could not use the copied request"));
        assert!(buffer.writes.is_empty());
    }

    #[tokio::test]
    async fn exit_choice_ends_the_session() {
        let config = test_config();
        let mut buffer = MemoryBuffer::holding(CAPTURE);
        let mut prompter = ScriptedPrompter::new(&["", "bye", "999", "3"]);

        run_session(&config, &mut buffer, &mut prompter).await.unwrap();

        assert!(prompter.saw("Exiting without sending."));
        // The snippet was still copied before the choice
        assert_eq!(buffer.writes.len(), 1);
    }

    #[test]
    fn affirmative_answers_are_recognized() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(is_yes("1"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("maybe"));
    }
}
