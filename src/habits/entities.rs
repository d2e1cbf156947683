use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a habit. New ids are UUID v4, but any string read from storage is
/// accepted as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Display for HabitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stored shape of a habit. Field names are part of the on-disk format.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub completed: bool,
    pub streak: u32,
    #[serde(default, with = "day_ser")]
    pub last_completed: Option<NaiveDate>,
}

impl Habit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HabitId::generate(),
            name: name.into(),
            completed: false,
            streak: 0,
            last_completed: None,
        }
    }

    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.last_completed == Some(day)
    }

    pub fn with_completion(self, completed: bool, last_completed: Option<NaiveDate>) -> Self {
        Self {
            completed,
            last_completed,
            ..self
        }
    }

    pub fn with_streak(self, streak: u32) -> Self {
        Self { streak, ..self }
    }

    /// Applies one toggle on `today`. A habit earns at most one streak point per day: undoing a
    /// completion keeps the point and locks the habit until the next day.
    pub fn toggle(&mut self, today: NaiveDate) -> Transition {
        if !self.completed && !self.completed_on(today) {
            self.completed = true;
            self.streak = self.streak.saturating_add(1);
            self.last_completed = Some(today);
            Transition::Completed
        } else if self.completed {
            self.completed = false;
            Transition::Undone
        } else {
            Transition::Locked
        }
    }

    /// Clears a completion left over from an earlier day. Returns whether anything changed.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.completed && !self.completed_on(today) {
            self.completed = false;
            true
        } else {
            false
        }
    }
}

/// Result of [Habit::toggle].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Marked done today, streak went up by one.
    Completed,
    /// Unmarked. Streak and last completion day are kept.
    Undone,
    /// Already completed and undone today. Nothing changed.
    Locked,
}

impl Transition {
    pub fn changed(self) -> bool {
        !matches!(self, Transition::Locked)
    }
}

mod day_ser {
    use chrono::NaiveDate;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{date_to_day_key, parse_day_key};

    pub fn serialize<S>(day: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match day {
            Some(day) => serializer.serialize_str(&date_to_day_key(*day)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse_day_key(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("Can't parse {s:?} into a day")))
    }
}
