use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cliclack::input;
use console::style;
use mdstream::handler::{HandlerRegistry, Invocation, CLIENTSIDE_NAMESPACE, STREAMING_CHAT_HANDLER};
use mdstream::models::{ChatHistory, UiState};
use mdstream::target::{FileTarget, MemoryTarget, RenderTarget};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::feedback::{Feedback, FeedbackKind, FeedbackRecord};
use crate::samples::sample_question;
use crate::terminal::{print_markup, TerminalTarget};

pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn bat_theme(&self) -> &'static str {
        match self {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Exit,
    New,
    Help,
    Sample,
    Good,
    Bad { kind: FeedbackKind, text: String },
    Message(String),
}

impl Command {
    fn parse(line: &str) -> Result<Command> {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("/exit") {
            return Ok(Command::Exit);
        }

        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };
        match head {
            "/new" => Ok(Command::New),
            "/?" => Ok(Command::Help),
            "/sample" => Ok(Command::Sample),
            "/good" => Ok(Command::Good),
            "/bad" => {
                let (kind, text) = match rest.split_once(char::is_whitespace) {
                    Some((kind, text)) => (kind, text.trim()),
                    None => (rest, ""),
                };
                if kind.is_empty() {
                    bail!(
                        "Usage: /bad <type> [details], type is one of: {}",
                        FeedbackKind::choices()
                    );
                }
                Ok(Command::Bad {
                    kind: kind.parse()?,
                    text: text.to_string(),
                })
            }
            _ => Ok(Command::Message(line.to_string())),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("exit - End the session");
    println!("/new - Start a new conversation");
    println!("/sample - Ask the suggested question");
    println!("/good - Rate the last reply up");
    println!("/bad <type> [details] - Rate the last reply down, type is one of:");
    for kind in FeedbackKind::ALL {
        println!("    {} - {}", kind.as_str(), kind.label());
    }
    println!("/? - Display this help message");
}

enum ReplyTarget {
    Terminal(TerminalTarget),
    File(FileTarget),
    Memory(MemoryTarget),
}

impl ReplyTarget {
    fn as_target(&mut self) -> &mut dyn RenderTarget {
        match self {
            ReplyTarget::Terminal(target) => target,
            ReplyTarget::File(target) => target,
            ReplyTarget::Memory(target) => target,
        }
    }
}

pub struct Session {
    registry: HandlerRegistry,
    formatted_context: String,
    output: Option<PathBuf>,
    theme: Theme,
    history: ChatHistory,
    conversation_id: Uuid,
    n_clicks: u64,
    busy: bool,
    suggestion: String,
    last_message_id: Option<Uuid>,
    feedback: Vec<FeedbackRecord>,
}

impl Session {
    pub fn new(registry: HandlerRegistry, formatted_context: String, output: Option<PathBuf>) -> Self {
        Session {
            registry,
            formatted_context,
            output,
            theme: Theme::Dark,
            history: ChatHistory::new(),
            conversation_id: Uuid::new_v4(),
            n_clicks: 0,
            busy: false,
            suggestion: sample_question(&mut rand::thread_rng()),
            last_message_id: None,
            feedback: Vec::new(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    /// Id of the most recent reply, the one feedback applies to.
    pub fn last_message_id(&self) -> Option<Uuid> {
        self.last_message_id
    }

    pub fn feedback_records(&self) -> &[FeedbackRecord] {
        &self.feedback
    }

    /// Forget the conversation so far.
    pub fn reset(&mut self) {
        self.history.clear();
        self.conversation_id = Uuid::new_v4();
        self.last_message_id = None;
        self.suggestion = sample_question(&mut rand::thread_rng());
        debug!(conversation_id = %self.conversation_id, "new conversation");
    }

    /// Rate the most recent reply.
    pub fn rate(&mut self, feedback: Feedback) -> Result<Uuid> {
        let Some(message_id) = self.last_message_id() else {
            bail!("There is no reply to rate yet");
        };

        match &feedback {
            Feedback::Positive => info!(
                conversation_id = %self.conversation_id,
                message_id = %message_id,
                "thumbs up"
            ),
            Feedback::Negative { kind, text } => info!(
                conversation_id = %self.conversation_id,
                message_id = %message_id,
                kind = kind.as_str(),
                text = %text,
                "thumbs down"
            ),
        }

        self.feedback.push(FeedbackRecord {
            conversation_id: self.conversation_id,
            message_id,
            feedback,
        });
        Ok(message_id)
    }

    pub async fn interactive(&mut self) -> Result<()> {
        println!(
            "mdstream {}",
            style("- type \"exit\" to end the session, \"/?\" for commands").dim()
        );
        println!();

        loop {
            let message_text: String = input("Message:")
                .placeholder(self.suggestion())
                .required(false)
                .interact()?;

            let command = match Command::parse(&message_text) {
                Ok(command) => command,
                Err(e) => {
                    cliclack::log::warning(e.to_string())?;
                    continue;
                }
            };

            match command {
                Command::Exit => break,
                Command::New => {
                    self.reset();
                    cliclack::log::info("Started a new conversation")?;
                }
                Command::Help => print_help(),
                Command::Sample => {
                    let question = std::mem::replace(
                        &mut self.suggestion,
                        sample_question(&mut rand::thread_rng()),
                    );
                    cliclack::log::info(&question)?;
                    self.submit(&question).await?;
                }
                Command::Good => self.report(Feedback::Positive)?,
                Command::Bad { kind, text } => {
                    self.report(Feedback::Negative { kind, text })?
                }
                Command::Message(text) => {
                    self.submit(&text).await?;
                }
            }
        }

        info!(
            conversation_id = %self.conversation_id,
            ratings = self.feedback_records().len(),
            "session ended"
        );
        Ok(())
    }

    fn report(&mut self, feedback: Feedback) -> Result<()> {
        match self.rate(feedback) {
            Ok(message_id) => {
                cliclack::log::success(format!("Thanks for the feedback on reply {}", message_id))?
            }
            Err(e) => cliclack::log::warning(e.to_string())?,
        }
        Ok(())
    }

    pub async fn headless(&mut self, prompt: &str) -> Result<()> {
        self.submit(prompt).await?;
        Ok(())
    }

    /// Send one prompt and render the reply. The caller must not submit
    /// again until the returned state says the session is no longer busy.
    pub async fn submit(&mut self, prompt: &str) -> Result<UiState> {
        if self.busy {
            bail!("A reply is still streaming, wait for it to finish");
        }

        self.n_clicks += 1;

        // An empty prompt is still handed over, the handler answers idle
        if !prompt.is_empty() {
            self.history.push_user(prompt);
        }

        let invocation = Invocation {
            formatted_context: self.formatted_context.clone(),
            n_clicks: self.n_clicks,
            prompt: prompt.to_string(),
            chat_history: self
                .history
                .to_wire()
                .context("Failed to encode chat history")?,
        };

        let object_id = format!("streaming-object-{}", rand::thread_rng().gen_range(1000..=9999));
        let mut target = match &self.output {
            _ if prompt.is_empty() => ReplyTarget::Memory(MemoryTarget::new()),
            Some(path) => ReplyTarget::File(FileTarget::new(path.clone())),
            None => ReplyTarget::Terminal(TerminalTarget::new(object_id.as_str())),
        };
        info!(
            conversation_id = %self.conversation_id,
            target = %object_id,
            "submitting prompt"
        );

        self.busy = true;
        let result = self
            .registry
            .dispatch(
                CLIENTSIDE_NAMESPACE,
                STREAMING_CHAT_HANDLER,
                &invocation,
                target.as_target(),
            )
            .await;

        let state = match result {
            Ok(state) => state,
            Err(e) => {
                if let ReplyTarget::Terminal(terminal) = &target {
                    terminal.fail("failed");
                }
                return Err(e).context("Streaming chat failed");
            }
        };
        self.busy = state.busy;

        if prompt.is_empty() {
            return Ok(state);
        }

        // The server expects markdown turns, not the rendered markup
        self.history
            .push_assistant(html2md::parse_html(&state.output).trim_end());
        let message_id = Uuid::new_v4();
        self.last_message_id = Some(message_id);
        debug!(message_id = %message_id, "reply received");

        match &target {
            ReplyTarget::Terminal(terminal) => {
                terminal.finish();
                print_markup(&state.output, self.theme.bat_theme())?;
            }
            ReplyTarget::File(file) => {
                println!(
                    "{} {}",
                    style(format!("Wrote {} bytes to", state.output.len())).dim(),
                    file.path().display()
                );
            }
            ReplyTarget::Memory(_) => {}
        }

        Ok(state)
    }
}
