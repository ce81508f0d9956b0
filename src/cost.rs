/*!

  An extended non-negative integer for SCOAP measures.

*/

/// A SCOAP measure: a non-negative integer cost with a distinguished
/// [`Cost::INFINITY`] for unreachable or uncomputable values.
///
/// Addition saturates at infinity, so a sum that touches an unreachable
/// operand stays unreachable. The sentinel sits near half the integer range,
/// which keeps sums of `fanin * max` clear of overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u32);

impl Cost {
    /// The unreachable/uncomputable sentinel.
    pub const INFINITY: Cost = Cost(u32::MAX / 2);

    /// A unit cost, one gate level or one clock event.
    pub const ONE: Cost = Cost(1);

    /// Zero cost.
    pub const ZERO: Cost = Cost(0);

    /// Creates a finite cost, clamping at [`Cost::INFINITY`].
    pub const fn new(value: u32) -> Self {
        if value >= Self::INFINITY.0 {
            Self::INFINITY
        } else {
            Cost(value)
        }
    }

    /// Returns `true` if this is the infinity sentinel.
    pub const fn is_infinite(self) -> bool {
        self.0 >= Self::INFINITY.0
    }

    /// Returns the finite value, or [`None`] for infinity.
    pub const fn value(self) -> Option<u32> {
        if self.is_infinite() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Renders the cost for external reports: infinity becomes `-1`.
    pub const fn report_value(self) -> i64 {
        if self.is_infinite() {
            -1
        } else {
            self.0 as i64
        }
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        if self.is_infinite() || rhs.is_infinite() {
            return Cost::INFINITY;
        }
        // Both operands are below the sentinel, so the widened sum fits.
        let sum = self.0 as u64 + rhs.0 as u64;
        if sum >= Cost::INFINITY.0 as u64 {
            Cost::INFINITY
        } else {
            Cost(sum as u32)
        }
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, |acc, c| acc + c)
    }
}

impl From<u32> for Cost {
    fn from(value: u32) -> Self {
        Cost::new(value)
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_addition() {
        assert_eq!(Cost::new(2) + Cost::new(3), Cost::new(5));
        assert_eq!(Cost::ZERO + Cost::ONE, Cost::new(1));
    }

    #[test]
    fn addition_saturates() {
        assert!((Cost::INFINITY + Cost::ONE).is_infinite());
        assert!((Cost::new(7) + Cost::INFINITY).is_infinite());
        let near = Cost::new(u32::MAX / 2 - 1);
        assert!((near + near).is_infinite());
    }

    #[test]
    fn min_prefers_finite() {
        assert_eq!(Cost::INFINITY.min(Cost::new(4)), Cost::new(4));
        assert_eq!(Cost::new(4).min(Cost::new(9)), Cost::new(4));
    }

    #[test]
    fn sum_of_iterator() {
        let total: Cost = [1, 2, 3].into_iter().map(Cost::new).sum();
        assert_eq!(total, Cost::new(6));
        let total: Cost = [Cost::ONE, Cost::INFINITY].into_iter().sum();
        assert!(total.is_infinite());
    }

    #[test]
    fn report_rendering() {
        assert_eq!(Cost::new(12).report_value(), 12);
        assert_eq!(Cost::INFINITY.report_value(), -1);
        assert_eq!(format!("{}", Cost::INFINITY), "inf");
        assert_eq!(format!("{}", Cost::new(3)), "3");
    }

    #[test]
    fn constructor_clamps() {
        assert!(Cost::new(u32::MAX).is_infinite());
        assert_eq!(Cost::new(u32::MAX).value(), None);
    }
}
