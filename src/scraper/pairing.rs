use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MtbError, Result};

/// What to do when two order-aligned sequences differ in length.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::EnumString,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum PairingPolicy {
    /// Refuse to pair sequences of different lengths.
    #[default]
    Strict,
    /// Pair up to the shorter sequence and drop the rest.
    BestEffort,
}

/// Pair `left[i]` with `right[i]`.
pub fn pair_aligned<L, R>(
    left: Vec<L>,
    right: Vec<R>,
    policy: PairingPolicy,
    context: &'static str,
) -> Result<Vec<(L, R)>> {
    if left.len() != right.len() {
        match policy {
            PairingPolicy::Strict => {
                return Err(MtbError::LengthMismatch {
                    context,
                    left: left.len(),
                    right: right.len(),
                });
            }
            PairingPolicy::BestEffort => warn!(
                context,
                left = left.len(),
                right = right.len(),
                "length mismatch, truncating to the shorter sequence"
            ),
        }
    }
    Ok(left.into_iter().zip(right).collect())
}

/// Split `items` into `(items[0], items[1]), (items[2], items[3]), ...`; an unpaired
/// trailing item is an error.
pub fn consecutive_pairs<T: Clone>(items: Vec<T>, context: &'static str) -> Result<Vec<(T, T)>> {
    if items.len() % 2 != 0 {
        return Err(MtbError::OddRowCount {
            context,
            rows: items.len(),
        });
    }
    Ok(items.into_iter().tuples().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_aligned_equal_lengths() {
        let pairs = pair_aligned(vec!["a", "b"], vec![1, 2], PairingPolicy::Strict, "t").unwrap();
        assert_eq!(pairs, [("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_pair_aligned_strict_mismatch() {
        let err = pair_aligned(vec!["a", "b", "c"], vec![1, 2], PairingPolicy::Strict, "races")
            .unwrap_err();
        assert!(matches!(
            err,
            MtbError::LengthMismatch {
                context: "races",
                left: 3,
                right: 2
            }
        ));
    }

    #[test]
    fn test_pair_aligned_best_effort_truncates() {
        let pairs =
            pair_aligned(vec!["a", "b", "c"], vec![1, 2], PairingPolicy::BestEffort, "t").unwrap();
        assert_eq!(pairs, [("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_consecutive_pairs() {
        assert_eq!(
            consecutive_pairs(vec![1, 2, 3, 4], "t").unwrap(),
            [(1, 2), (3, 4)]
        );
        assert!(consecutive_pairs(Vec::<u8>::new(), "t").unwrap().is_empty());
        assert!(matches!(
            consecutive_pairs(vec![1, 2, 3], "rows"),
            Err(MtbError::OddRowCount { rows: 3, .. })
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("best-effort".parse::<PairingPolicy>().unwrap(), PairingPolicy::BestEffort);
        assert_eq!(PairingPolicy::default().to_string(), "strict");
    }
}
