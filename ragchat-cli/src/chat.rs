//! Interactive chat loop.

use anyhow::Result;
use ragchat_chain::ChatSession;
use ragchat_model::{Message, Role};
use ragchat_rag::SearchResult;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

const USER_PROMPT: &str = "you> ";
const ASSISTANT_PROMPT: &str = "assistant> ";

pub const HELP: &str = "\
Ask a question about your documents, or use a command:
  /history  show the conversation so far
  /sources  show the passages behind the last answer
  /clear    start a new conversation
  /help     show this message
  /exit     quit (Ctrl-D works too)";

/// A slash command typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    History,
    Sources,
    Clear,
    Help,
    Exit,
}

/// What the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Command(Command),
    UnknownCommand(String),
    Question(String),
}

/// Classify one line typed at the prompt.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(name) = line.strip_prefix('/') else {
        return Input::Question(line.to_string());
    };
    match name.to_ascii_lowercase().as_str() {
        "history" => Input::Command(Command::History),
        "sources" => Input::Command(Command::Sources),
        "clear" => Input::Command(Command::Clear),
        "help" | "?" => Input::Command(Command::Help),
        "exit" | "quit" => Input::Command(Command::Exit),
        _ => Input::UnknownCommand(line.to_string()),
    }
}

/// One turn with its `you>` or `assistant>` prompt.
pub fn render_turn(message: &Message) -> String {
    let prompt = match message.role {
        Role::User => USER_PROMPT,
        Role::Assistant => ASSISTANT_PROMPT,
        Role::System => "system> ",
    };
    format!("{prompt}{}", message.content)
}

/// The whole conversation, one turn per line.
pub fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return "(no messages yet)".to_string();
    }
    history.iter().map(render_turn).collect::<Vec<_>>().join("\n")
}

/// Numbered sources with score, offset and a short preview.
pub fn render_sources(sources: &[SearchResult]) -> String {
    if sources.is_empty() {
        return "(no sources yet)".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let start = hit.chunk.start_index().map(|s| format!(", offset {s}")).unwrap_or_default();
            let preview: String = hit.chunk.text.chars().take(80).collect();
            let preview = preview.replace('\n', " ");
            format!(
                "[{}] {} (score {:.3}{start})\n    {preview}",
                i + 1,
                hit.chunk.source(),
                hit.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the REPL until `/exit`, Ctrl-C or Ctrl-D.
pub async fn run(mut session: ChatSession) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("ragchat ready. Type /help for commands.");

    loop {
        let line = match tokio::task::block_in_place(|| editor.readline(USER_PROMPT)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let input = parse_input(&line);
        if input != Input::Empty {
            editor.add_history_entry(line.trim())?;
        }

        match input {
            Input::Empty => {}
            Input::Command(Command::Exit) => break,
            Input::Command(Command::Help) => println!("{HELP}"),
            Input::Command(Command::History) => println!("{}", render_history(session.history())),
            Input::Command(Command::Sources) => {
                println!("{}", render_sources(session.last_sources()))
            }
            Input::Command(Command::Clear) => {
                session.clear();
                println!("Conversation cleared.");
            }
            Input::UnknownCommand(cmd) => println!("Unknown command {cmd}. Type /help."),
            Input::Question(question) => match session.send(&question).await {
                Ok(answer) => println!("{ASSISTANT_PROMPT}{}", answer.answer),
                Err(e) => println!("{ASSISTANT_PROMPT}{e}"),
            },
        }
    }

    debug!(session_id = session.id(), "chat ended");
    println!("Bye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ragchat_rag::Chunk;

    use super::*;

    #[test]
    fn parses_commands_and_questions() {
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("/exit"), Input::Command(Command::Exit));
        assert_eq!(parse_input(" /History "), Input::Command(Command::History));
        assert_eq!(parse_input("/nope"), Input::UnknownCommand("/nope".to_string()));
        assert_eq!(parse_input(" what is rust? "), Input::Question("what is rust?".to_string()));
    }

    #[test]
    fn history_renders_with_role_prompts() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        assert_eq!(render_history(&history), "you> hi\nassistant> hello");
        assert_eq!(render_history(&[]), "(no messages yet)");
    }

    #[test]
    fn sources_show_origin_and_score() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "data/raw/a.md".to_string());
        metadata.insert("start_index".to_string(), "42".to_string());
        let hit = SearchResult {
            chunk: Chunk {
                id: "a.md_1".to_string(),
                text: "line one\nline two".to_string(),
                embedding: Vec::new(),
                metadata,
                document_id: "a.md".to_string(),
            },
            score: 0.87654,
        };
        let rendered = render_sources(&[hit]);
        let expected = "[1] data/raw/a.md (score 0.877, offset 42)\n    line one line two";
        assert_eq!(rendered, expected);
    }
}
