use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    storage::KeyValueStore,
    utils::{clock::Clock, percentage::Percentage},
};

use super::entities::{Habit, HabitId, Transition};

/// Key holding the serialized habit list.
pub const HABITS_KEY: &str = "habits";
/// Key receiving the raw value of a habit list that could not be parsed.
pub const CORRUPT_HABITS_KEY: &str = "habits.corrupt";

/// Owns the habit list and keeps `storage` in sync with it. Every operation that changes a habit
/// writes the whole list back before returning. Arguments that don't point at anything are
/// ignored, so the only errors are storage failures.
pub struct HabitStore<S: KeyValueStore> {
    habits: Vec<Habit>,
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> HabitStore<S> {
    /// Reads previously saved habits. Missing or unreadable data starts an empty tracker.
    pub fn load(mut storage: S, clock: Box<dyn Clock>) -> Result<Self> {
        let habits = read_habits(&mut storage)?;
        debug!("Loaded {} habits", habits.len());
        let mut store = Self {
            habits,
            storage,
            clock,
        };
        store.refresh();
        Ok(store)
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == *id)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn completed_count(&self) -> usize {
        self.habits.iter().filter(|habit| habit.completed).count()
    }

    /// Share of habits completed today, rounded half up. 0% for an empty tracker.
    pub fn completion_rate(&self) -> Percentage {
        Percentage::of(self.completed_count(), self.habits.len())
    }

    /// Catches up with the calendar: completions from earlier days are cleared.
    /// Returns whether anything changed. A failed save only logs; the next change writes the
    /// rolled over list anyway.
    pub fn refresh(&mut self) -> bool {
        let today = self.clock.today();
        let changed = self.roll_over(today);
        if changed {
            if let Err(e) = self.save() {
                warn!("Couldn't save habits after a day change {e:?}");
            }
        }
        changed
    }

    /// Appends a habit called `name`. Blank names are ignored.
    pub fn add(&mut self, name: &str) -> Result<Option<HabitId>> {
        let rolled = self.roll_over(self.clock.today());
        let name = name.trim();
        if name.is_empty() {
            debug!("Ignoring habit with a blank name");
            return self.finish(rolled, None);
        }

        let habit = Habit::new(name);
        let id = habit.id.clone();
        info!("Adding habit {id} {name:?}");
        self.habits.push(habit);
        self.finish(true, Some(id))
    }

    /// Marks the habit done for today or undoes it. See [Habit::toggle].
    pub fn toggle(&mut self, id: &HabitId) -> Result<Option<Transition>> {
        let today = self.clock.today();
        let rolled = self.roll_over(today);
        let Some(habit) = self.habits.iter_mut().find(|habit| habit.id == *id) else {
            debug!("Toggle of unknown habit {id}");
            return self.finish(rolled, None);
        };

        let transition = habit.toggle(today);
        info!(
            "Toggled habit {id}: {transition:?}, streak {}",
            habit.streak
        );
        self.finish(rolled || transition.changed(), Some(transition))
    }

    /// Removes the habit and returns it.
    pub fn delete(&mut self, id: &HabitId) -> Result<Option<Habit>> {
        let rolled = self.roll_over(self.clock.today());
        let Some(position) = self.habits.iter().position(|habit| habit.id == *id) else {
            debug!("Delete of unknown habit {id}");
            return self.finish(rolled, None);
        };

        let removed = self.habits.remove(position);
        info!("Deleted habit {id} {:?}", removed.name);
        self.finish(true, Some(removed))
    }

    fn roll_over(&mut self, today: NaiveDate) -> bool {
        let mut changed = false;
        for habit in self.habits.iter_mut() {
            if habit.roll_over(today) {
                debug!("Habit {} was completed on an earlier day", habit.id);
                changed = true;
            }
        }
        changed
    }

    fn finish<T>(&mut self, changed: bool, value: T) -> Result<T> {
        if changed {
            self.save()?;
        }
        Ok(value)
    }

    /// Writes the whole list, including an empty one.
    fn save(&mut self) -> Result<()> {
        let serialized = serde_json::to_string(&self.habits)?;
        self.storage
            .set(HABITS_KEY, &serialized)
            .context("Failed to save habits")?;
        debug!("Saved {} habits", self.habits.len());
        Ok(())
    }
}

fn read_habits(storage: &mut impl KeyValueStore) -> Result<Vec<Habit>> {
    let Some(raw) = storage.get(HABITS_KEY).context("Failed to read habits")? else {
        debug!("No saved habits");
        return Ok(vec![]);
    };

    match serde_json::from_str::<Vec<Habit>>(&raw) {
        Ok(habits) => Ok(sanitize(habits)),
        Err(e) => {
            warn!("Saved habits were corrupted, starting empty: {e}");
            if !raw.trim().is_empty() {
                if let Err(e) = storage.set(CORRUPT_HABITS_KEY, &raw) {
                    warn!("Couldn't keep a copy of corrupted habits {e:?}");
                }
            }
            Ok(vec![])
        }
    }
}

/// Drops records that break the list invariants: repeated ids keep their first occurrence and
/// nameless habits are skipped.
fn sanitize(habits: Vec<Habit>) -> Vec<Habit> {
    let mut seen = HashSet::new();
    habits
        .into_iter()
        .filter(|habit| {
            if habit.name.trim().is_empty() {
                warn!("Skipping saved habit {} without a name", habit.id);
                return false;
            }
            if !seen.insert(habit.id.clone()) {
                warn!("Skipping saved habit with repeated id {}", habit.id);
                return false;
            }
            true
        })
        .collect()
}
