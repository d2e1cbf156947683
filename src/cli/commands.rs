use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::{
    habits::{entities::Transition, store::HabitStore},
    storage::KeyValueStore,
};

use super::{render::Renderer, selector::resolve_habit};

/// A user intent, shared by one-shot subcommands and session lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitCommand {
    Add(String),
    Toggle(String),
    Delete(String),
    List,
    Progress,
}

/// Applies `command` to the store and writes what the user should see next.
pub fn execute<S: KeyValueStore>(
    store: &mut HabitStore<S>,
    command: HabitCommand,
    out: &mut impl Write,
    renderer: &Renderer,
) -> Result<()> {
    debug!("Executing {command:?}");
    match command {
        HabitCommand::Add(name) => {
            if store.add(&name)?.is_none() {
                writeln!(out, "A habit needs a name.")?;
                return Ok(());
            }
            write_tracker(store, out, renderer)
        }
        HabitCommand::Toggle(selector) => {
            let Some(id) = resolve_habit(store.habits(), &selector) else {
                return write_no_match(out, &selector);
            };
            if store.toggle(&id)? == Some(Transition::Locked) {
                writeln!(out, "Already counted today. Come back tomorrow.")?;
            }
            write_tracker(store, out, renderer)
        }
        HabitCommand::Delete(selector) => {
            let Some(id) = resolve_habit(store.habits(), &selector) else {
                return write_no_match(out, &selector);
            };
            if let Some(removed) = store.delete(&id)? {
                writeln!(out, "Deleted {}.", removed.name)?;
            }
            write_tracker(store, out, renderer)
        }
        HabitCommand::List => {
            store.refresh();
            write_tracker(store, out, renderer)
        }
        HabitCommand::Progress => {
            store.refresh();
            match renderer.progress(
                store.completed_count(),
                store.habits().len(),
                store.completion_rate(),
            ) {
                Some(progress) => write!(out, "{progress}")?,
                None => writeln!(out, "No habits yet.")?,
            }
            Ok(())
        }
    }
}

fn write_tracker<S: KeyValueStore>(
    store: &HabitStore<S>,
    out: &mut impl Write,
    renderer: &Renderer,
) -> Result<()> {
    write!(out, "{}", renderer.habits(store.habits()))?;
    if let Some(progress) = renderer.progress(
        store.completed_count(),
        store.habits().len(),
        store.completion_rate(),
    ) {
        write!(out, "\n{progress}")?;
    }
    Ok(())
}

fn write_no_match(out: &mut impl Write, selector: &str) -> Result<()> {
    writeln!(out, "No habit matches {selector:?}.")?;
    Ok(())
}
