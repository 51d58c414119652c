use ratchet_common::{Error, Result};

/// Validate a textual target version against a list of `available`
/// migrations.
///
/// `None` is `TargetMissing`. Text that is not an integer, or is negative, is
/// `InvalidTarget`. A number above `available` is `TargetOutOfBounds`. Both 0
/// and `available` itself are valid.
pub fn resolve_target(spec: Option<&str>, available: usize) -> Result<u32> {
    let raw = spec.ok_or(Error::TargetMissing)?;
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidTarget(raw.to_string()));
    }

    // Only overflow can fail here; such a number is past any list.
    let value: u64 = digits.parse().unwrap_or(u64::MAX);
    if value > available as u64 {
        return Err(Error::TargetOutOfBounds {
            target: value,
            available,
        });
    }
    u32::try_from(value).map_err(|_| Error::TargetOutOfBounds {
        target: value,
        available,
    })
}

/// Bounds check for a target that is already numeric.
pub(crate) fn check_bounds(target: u32, available: usize) -> Result<u32> {
    if target as usize > available {
        return Err(Error::TargetOutOfBounds {
            target: u64::from(target),
            available,
        });
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_is_an_error() {
        assert!(matches!(resolve_target(None, 3), Err(Error::TargetMissing)));
    }

    #[test]
    fn non_numeric_target_is_invalid() {
        for spec in ["a", "", "1.5", "two", "0x2", "+", "1e3", "true"] {
            assert!(
                matches!(resolve_target(Some(spec), 3), Err(Error::InvalidTarget(_))),
                "{spec:?} should be invalid"
            );
        }
    }

    #[test]
    fn negative_target_is_invalid() {
        let huge_negative = format!("-{}", "9".repeat(45));
        for spec in ["-1", "-0", huge_negative.as_str()] {
            assert!(
                matches!(resolve_target(Some(spec), 3), Err(Error::InvalidTarget(_))),
                "{spec:?} should be invalid"
            );
        }
    }

    #[test]
    fn target_above_list_length_is_out_of_bounds() {
        match resolve_target(Some("5"), 1) {
            Err(Error::TargetOutOfBounds { target, available }) => {
                assert_eq!(target, 5);
                assert_eq!(available, 1);
            }
            other => panic!("expected TargetOutOfBounds, got {other:?}"),
        }
        assert!(matches!(
            resolve_target(Some("99999999999999999999"), 1),
            Err(Error::TargetOutOfBounds { .. })
        ));
        match resolve_target(Some(&"9".repeat(45)), 3) {
            Err(Error::TargetOutOfBounds { target, available }) => {
                assert_eq!(target, u64::MAX);
                assert_eq!(available, 3);
            }
            other => panic!("expected TargetOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn zero_and_full_length_are_valid() {
        assert_eq!(resolve_target(Some("0"), 2).unwrap(), 0);
        assert_eq!(resolve_target(Some("2"), 2).unwrap(), 2);
        assert_eq!(resolve_target(Some("0"), 0).unwrap(), 0);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(resolve_target(Some(" 1\n"), 2).unwrap(), 1);
        assert_eq!(resolve_target(Some("+2"), 2).unwrap(), 2);
    }

    #[test]
    fn numeric_bounds_check() {
        assert_eq!(check_bounds(2, 2).unwrap(), 2);
        assert!(matches!(
            check_bounds(3, 2),
            Err(Error::TargetOutOfBounds { .. })
        ));
    }
}
