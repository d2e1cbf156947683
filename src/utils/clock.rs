use chrono::{Local, NaiveDate};

/// Represents an entity responsible for providing the current calendar day across application.
/// Lets tests move through days without touching the system clock.
pub trait Clock {
    /// Local calendar day. No time-of-day component takes part in habit logic.
    fn today(&self) -> NaiveDate;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[cfg(test)]
pub mod test_clock {
    use std::{cell::Cell, rc::Rc};

    use chrono::{Days, NaiveDate};

    use super::Clock;

    /// Clock stuck on a day until the test advances it. Clones share the same day.
    #[derive(Clone)]
    pub struct TestClock {
        day: Rc<Cell<NaiveDate>>,
    }

    impl TestClock {
        pub fn new(day: NaiveDate) -> Self {
            Self {
                day: Rc::new(Cell::new(day)),
            }
        }

        pub fn advance_days(&self, days: u64) {
            let next = self
                .day
                .get()
                .checked_add_days(Days::new(days))
                .expect("test dates stay in range");
            self.day.set(next);
        }
    }

    impl Clock for TestClock {
        fn today(&self) -> NaiveDate {
            self.day.get()
        }
    }
}
