use std::mem::replace;

/// A year range iterator that yields each year from the start year
/// through the end year (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct YearRange(pub i32, pub i32);

impl YearRange {
    /// Number of years left in the range.
    pub fn span(&self) -> usize {
        if self.0 <= self.1 {
            (i64::from(self.1) - i64::from(self.0)) as usize + 1
        } else {
            0
        }
    }
}

impl Iterator for YearRange {
    type Item = i32;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            match self.0.checked_add(1) {
                Some(next) => Some(replace(&mut self.0, next)),
                None => {
                    // last representable year, close the range
                    self.1 = self.0 - 1;
                    Some(self.0)
                }
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::YearRange;

    #[test]
    fn test_year_range_iteration() {
        let range = YearRange(2018, 2024);
        assert_eq!(range.span(), 7);
        let years: Vec<i32> = range.collect();
        assert_eq!(years.len(), 7);
        assert_eq!(years[0], 2018);
        assert_eq!(years[6], 2024);
    }

    #[test]
    fn test_year_range_single_year() {
        let years: Vec<i32> = YearRange(2021, 2021).collect();
        assert_eq!(years, vec![2021]);
    }

    #[test]
    fn test_year_range_ends_at_max_year() {
        let range = YearRange(i32::MAX - 1, i32::MAX);
        assert_eq!(range.span(), 2);
        let years: Vec<i32> = range.collect();
        assert_eq!(years, vec![i32::MAX - 1, i32::MAX]);
        assert_eq!(YearRange(i32::MIN, i32::MAX).span(), u32::MAX as usize + 1);
    }

    #[test]
    fn test_year_range_empty() {
        let range = YearRange(2024, 2018);
        assert_eq!(range.span(), 0);
        assert_eq!(range.count(), 0);
    }
}
