use std::{fmt::Write, io::IsTerminal};

use ansi_term::{Colour, Style};

use crate::{habits::entities::Habit, utils::percentage::Percentage};

const BAR_WIDTH: usize = 20;
const SHORT_ID_LEN: usize = 8;

/// Turns habits into text for the terminal. Colors are only used when writing to a terminal.
pub struct Renderer {
    colored: bool,
}

impl Renderer {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn for_stdout() -> Self {
        Self::new(std::io::stdout().is_terminal())
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colored {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// One line per habit, numbered from 1 in list order.
    pub fn habits(&self, habits: &[Habit]) -> String {
        if habits.is_empty() {
            return "No habits yet. Add one with `add <name>`.\n".to_string();
        }

        let mut text = String::new();
        for (index, habit) in habits.iter().enumerate() {
            let (mark, name) = if habit.completed {
                ("[x]", self.paint(Colour::Green.strikethrough(), &habit.name))
            } else {
                ("[ ]", self.paint(Style::new(), &habit.name))
            };
            let streak = self.paint(Colour::Yellow.normal(), &streak_label(habit.streak));
            let id = self.paint(Style::new().dimmed(), &short_id(habit));
            // Writing into a String can't fail
            let _ = writeln!(text, "{:>2}. {mark} {name}  {streak}  {id}", index + 1);
        }
        text
    }

    /// Today's progress. Nothing is shown for an empty tracker.
    pub fn progress(&self, completed: usize, total: usize, rate: Percentage) -> Option<String> {
        if total == 0 {
            return None;
        }
        let filled = (BAR_WIDTH * *rate as usize + 50) / 100;
        let bar = format!(
            "{}{}",
            self.paint(Colour::Green.normal(), &"█".repeat(filled)),
            "░".repeat(BAR_WIDTH - filled)
        );
        Some(format!(
            "Today's progress\n{bar} {rate}\n{completed} of {total} habits completed\n"
        ))
    }
}

fn streak_label(streak: u32) -> String {
    if streak == 1 {
        "🔥 1 day".to_string()
    } else {
        format!("🔥 {streak} days")
    }
}

fn short_id(habit: &Habit) -> String {
    habit.id.as_str().chars().take(SHORT_ID_LEN).collect()
}
