use std::{fmt::Display, ops::Deref};

/// Whole-number percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percentage(u8);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    /// Share of `part` in `whole`, rounded half up. An empty whole is 0%.
    /// Saturates at 100% if `part` exceeds `whole`.
    pub fn of(part: usize, whole: usize) -> Percentage {
        if whole == 0 {
            return Percentage(0);
        }
        let part = part.min(whole) as u128;
        let whole = whole as u128;
        // round(100 * part / whole) == floor((200 * part + whole) / (2 * whole))
        let value = (200 * part + whole) / (2 * whole);
        Percentage(value as u8)
    }
}

impl Deref for Percentage {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Percentage;

    #[test]
    fn empty_whole_is_zero() {
        assert_eq!(*Percentage::of(0, 0), 0);
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(*Percentage::of(2, 3), 67);
        assert_eq!(*Percentage::of(1, 3), 33);
        assert_eq!(*Percentage::of(1, 8), 13);
        assert_eq!(*Percentage::of(1, 2), 50);
        assert_eq!(*Percentage::of(3, 3), 100);
    }

    #[test]
    fn display_has_percent_sign() {
        assert_eq!(Percentage::of(2, 3).to_string(), "67%");
    }
}
