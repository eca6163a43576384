use crate::Beat;

/// A half-open `[start, end)` span on the beat axis.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug, Default)]
pub struct Range {
    pub start: Beat,
    pub end: Beat,
}

impl Range {
    pub fn from_start_length(start: Beat, length: Beat) -> Self {
        Self {
            start,
            end: start.saturating_add(length),
        }
    }

    pub fn length(&self) -> Beat {
        self.end - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.length() <= 0
    }

    /// Touching ranges (`self.end == other.start`) do not intersect.
    pub fn intersects(&self, other: Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[cfg(test)]
mod tests {
    use super::Range;

    #[test]
    fn touching_ranges_do_not_intersect() {
        let a = Range::from_start_length(0, 10);
        assert!(!a.intersects(Range::from_start_length(10, 5)));
        assert!(a.intersects(Range::from_start_length(9, 5)));
    }

    #[test]
    fn non_positive_length_is_empty() {
        assert!(Range::from_start_length(3, 0).is_empty());
        assert!(Range::from_start_length(3, -4).is_empty());
        assert_eq!(Range::from_start_length(4, 16).length(), 16);
    }
}
