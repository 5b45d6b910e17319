/// A numeric filter domain or selection.
///
/// A domain whose minimum equals its maximum is always `Fixed`, so callers
/// never see a zero-width range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound<T> {
    Range { min: T, max: T },
    Fixed(T),
}

impl<T: Copy + Ord> Bound<T> {
    /// Build from two ends, in either order.
    pub fn new(a: T, b: T) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        if min == max {
            Self::Fixed(min)
        } else {
            Self::Range { min, max }
        }
    }

    /// Smallest bound covering every value, `None` for an empty iterator.
    pub fn spanning(values: impl IntoIterator<Item = T>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self::new(min, max))
    }

    pub fn min(&self) -> T {
        match *self {
            Self::Range { min, .. } => min,
            Self::Fixed(v) => v,
        }
    }

    pub fn max(&self) -> T {
        match *self {
            Self::Range { max, .. } => max,
            Self::Fixed(v) => v,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Inclusive membership.
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        match *self {
            Self::Range { min, max } => min <= value && value <= max,
            Self::Fixed(v) => v == value,
        }
    }

    pub fn clamp(&self, value: T) -> T {
        value.max(self.min()).min(self.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ends_collapse_to_fixed() {
        assert_eq!(Bound::new(2001, 2001), Bound::Fixed(2001));
        assert_eq!(Bound::new(2003, 2001), Bound::Range { min: 2001, max: 2003 });
    }

    #[test]
    fn spanning_values() {
        assert_eq!(Bound::spanning([5u32, 0, 3]), Some(Bound::Range { min: 0, max: 5 }));
        assert_eq!(Bound::spanning([7u32, 7]), Some(Bound::Fixed(7)));
        assert_eq!(Bound::<u32>::spanning([]), None);
    }

    #[test]
    fn fixed_contains_only_its_value() {
        let b = Bound::Fixed(1999);
        assert!(b.contains(1999));
        assert!(!b.contains(2000));
        assert_eq!(b.min(), b.max());
    }

    #[test]
    fn range_is_inclusive() {
        let b = Bound::new(2001, 2003);
        assert!(b.contains(2001) && b.contains(2003));
        assert!(!b.contains(2004));
        assert_eq!(b.clamp(1990), 2001);
        assert_eq!(b.clamp(2010), 2003);
    }
}
