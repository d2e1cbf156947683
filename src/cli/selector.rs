use crate::habits::entities::{Habit, HabitId};

/// Finds the habit a user refers to. In order of preference: the exact id, a 1-based position in
/// the list (`2` or `#2`), or an id prefix shared by no other habit.
pub fn resolve_habit(habits: &[Habit], selector: &str) -> Option<HabitId> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }

    if let Some(habit) = habits.iter().find(|habit| habit.id.as_str() == selector) {
        return Some(habit.id.clone());
    }

    let position = selector.trim_start_matches('#');
    if let Ok(position) = position.parse::<usize>() {
        if let Some(habit) = position.checked_sub(1).and_then(|index| habits.get(index)) {
            return Some(habit.id.clone());
        }
    }

    let mut matching = habits
        .iter()
        .filter(|habit| habit.id.as_str().starts_with(selector));
    match (matching.next(), matching.next()) {
        (Some(habit), None) => Some(habit.id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_habit;
    use crate::habits::entities::{Habit, HabitId};

    fn habits() -> Vec<Habit> {
        ["ab12", "ab34", "cd56", "2"]
            .into_iter()
            .map(|id| Habit {
                id: HabitId::from(id),
                ..Habit::new(id)
            })
            .collect()
    }

    #[test]
    fn exact_id_wins() {
        assert_eq!(resolve_habit(&habits(), "2"), Some(HabitId::from("2")));
        assert_eq!(resolve_habit(&habits(), "ab34"), Some(HabitId::from("ab34")));
    }

    #[test]
    fn positions_start_at_one() {
        assert_eq!(resolve_habit(&habits(), "1"), Some(HabitId::from("ab12")));
        assert_eq!(resolve_habit(&habits(), "#3"), Some(HabitId::from("cd56")));
        assert_eq!(resolve_habit(&habits(), "0"), None);
        assert_eq!(resolve_habit(&habits(), "9"), None);
    }

    #[test]
    fn prefix_must_be_unambiguous() {
        assert_eq!(resolve_habit(&habits(), "cd"), Some(HabitId::from("cd56")));
        assert_eq!(resolve_habit(&habits(), "ab"), None);
        assert_eq!(resolve_habit(&habits(), "zz"), None);
        assert_eq!(resolve_habit(&habits(), "  "), None);
    }
}
