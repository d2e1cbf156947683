use std::io::Write;

use anyhow::Result;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    select,
    sync::mpsc,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{habits::store::HabitStore, storage::KeyValueStore};

use super::{
    commands::{execute, HabitCommand},
    render::Renderer,
};

const HELP: &str = "\
Commands:
  add <name>        add a habit
  toggle <habit>    mark a habit done today, or undo it
  delete <habit>    remove a habit
  list              show all habits
  progress          show today's progress
  help              show this message
  quit              leave the session
<habit> is a list position, an id, or the start of an id.
";

const PROMPT: &str = "> ";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Command(HabitCommand),
    Help,
    Quit,
    Unknown(String),
}

/// Parses a session line. Blank lines produce nothing.
pub fn parse_line(line: &str) -> Option<SessionEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let event = match word.to_lowercase().as_str() {
        "add" | "a" => SessionEvent::Command(HabitCommand::Add(rest.to_string())),
        "toggle" | "t" | "done" => SessionEvent::Command(HabitCommand::Toggle(rest.to_string())),
        "delete" | "rm" | "d" => SessionEvent::Command(HabitCommand::Delete(rest.to_string())),
        "list" | "ls" | "l" => SessionEvent::Command(HabitCommand::List),
        "progress" | "p" => SessionEvent::Command(HabitCommand::Progress),
        "help" | "h" | "?" => SessionEvent::Help,
        "quit" | "exit" | "q" => SessionEvent::Quit,
        _ => SessionEvent::Unknown(line.to_string()),
    };
    Some(event)
}

/// Reads lines from `input` and forwards them as events until input ends or the session is
/// cancelled.
async fn read_events(
    input: impl AsyncRead + Unpin,
    sender: mpsc::Sender<SessionEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut lines = LinesStream::new(BufReader::new(input).lines());
    loop {
        let line = select! {
            _ = shutdown.cancelled() => break,
            line = lines.next() => line,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Failed to read input {e:?}");
                return Err(e.into());
            }
            None => break,
        };
        let Some(event) = parse_line(&line) else {
            continue;
        };
        if sender.send(event).await.is_err() {
            break;
        }
    }
    debug!("Input finished");
    Ok(())
}

/// Runs an interactive session. Events are applied one at a time and each runs to completion
/// before the next is received. Failing to save is reported and the session goes on.
pub async fn run_session<S: KeyValueStore>(
    mut store: HabitStore<S>,
    input: impl AsyncRead + Unpin + Send + 'static,
    out: &mut impl Write,
    renderer: &Renderer,
    shutdown: CancellationToken,
) -> Result<()> {
    let (sender, mut receiver) = mpsc::channel::<SessionEvent>(16);
    let reader = tokio::spawn(read_events(input, sender, shutdown.clone()));

    info!("Session started with {} habits", store.habits().len());
    execute(&mut store, HabitCommand::List, out, renderer)?;
    write_prompt(out)?;

    loop {
        let event = select! {
            _ = shutdown.cancelled() => break,
            event = receiver.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        debug!("Processing event {event:?}");

        match event {
            SessionEvent::Command(command) => {
                if let Err(e) = execute(&mut store, command.clone(), out, renderer) {
                    error!("Error processing {command:?}: {e:?}");
                    writeln!(out, "Something went wrong: {e:#}")?;
                }
            }
            SessionEvent::Help => write!(out, "{HELP}")?,
            SessionEvent::Quit => break,
            SessionEvent::Unknown(line) => {
                writeln!(out, "Unknown command {line:?}.")?;
                write!(out, "{HELP}")?;
            }
        }
        write_prompt(out)?;
    }

    // The reader may be parked on a read that never completes, so it is not awaited.
    shutdown.cancel();
    reader.abort();
    writeln!(out)?;
    info!("Session finished");
    Ok(())
}

fn write_prompt(out: &mut impl Write) -> Result<()> {
    write!(out, "{PROMPT}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::Result;
    use chrono::NaiveDate;
    use tokio_util::sync::CancellationToken;

    use super::{parse_line, run_session, SessionEvent};
    use crate::{
        cli::{commands::HabitCommand, render::Renderer},
        habits::store::{HabitStore, HABITS_KEY},
        storage::{memory::MemoryStore, KeyValueStore},
        utils::{clock::test_clock::TestClock, logging::TEST_LOGGING},
    };

    const TEST_DAY: NaiveDate = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_line("add Read 10 pages"),
            Some(SessionEvent::Command(HabitCommand::Add("Read 10 pages".into())))
        );
        assert_eq!(
            parse_line("  TOGGLE   2 "),
            Some(SessionEvent::Command(HabitCommand::Toggle("2".into())))
        );
        assert_eq!(
            parse_line("rm ab12"),
            Some(SessionEvent::Command(HabitCommand::Delete("ab12".into())))
        );
        assert_eq!(parse_line("list"), Some(SessionEvent::Command(HabitCommand::List)));
        assert_eq!(parse_line("exit"), Some(SessionEvent::Quit));
        assert_eq!(parse_line("?"), Some(SessionEvent::Help));
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line("dance"),
            Some(SessionEvent::Unknown("dance".into()))
        );
    }

    #[test]
    fn add_without_name_keeps_empty_argument() {
        assert_eq!(
            parse_line("add"),
            Some(SessionEvent::Command(HabitCommand::Add(String::new())))
        );
    }

    #[tokio::test]
    async fn session_applies_events_in_order() -> Result<()> {
        *TEST_LOGGING;
        let clock = TestClock::new(TEST_DAY);
        let mut storage = MemoryStore::new();
        let store = HabitStore::load(&mut storage, Box::new(clock))?;

        let input = Cursor::new(b"add Read\nadd Walk\n\ntoggle 1\ntoggle 2\ntoggle 2\nwhat\nquit\nadd Never\n".to_vec());
        let mut out = Vec::new();

        run_session(
            store,
            input,
            &mut out,
            &Renderer::new(false),
            CancellationToken::new(),
        )
        .await?;

        let text = String::from_utf8(out)?;
        assert!(text.contains("Unknown command \"what\""));
        assert!(text.contains("1 of 2 habits completed"));
        assert!(!text.contains("Never"));

        let saved = storage.get(HABITS_KEY)?.unwrap_or_default();
        assert!(saved.contains("\"Read\""));
        assert!(saved.contains("\"Walk\""));
        assert!(!saved.contains("Never"));
        Ok(())
    }

    #[tokio::test]
    async fn session_ends_with_input() -> Result<()> {
        let clock = TestClock::new(TEST_DAY);
        let store = HabitStore::load(MemoryStore::new(), Box::new(clock))?;
        let mut out = Vec::new();

        run_session(
            store,
            Cursor::new(b"add Read".to_vec()),
            &mut out,
            &Renderer::new(false),
            CancellationToken::new(),
        )
        .await?;

        assert!(String::from_utf8(out)?.contains("[ ] Read"));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_session_stops() -> Result<()> {
        let clock = TestClock::new(TEST_DAY);
        let store = HabitStore::load(MemoryStore::new(), Box::new(clock))?;
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (_keep_open, input) = tokio::io::duplex(64);
        let mut out = Vec::new();

        run_session(store, input, &mut out, &Renderer::new(false), shutdown).await?;

        assert!(String::from_utf8(out)?.contains("No habits yet"));
        Ok(())
    }
}
