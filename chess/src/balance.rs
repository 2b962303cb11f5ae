use chess_core::types::BalancePolicy;
use chess_core::{Error, Result};

/// Checks whether `white_len`/`black_len` satisfy `policy`, per the
/// normative balance rules (spec 4.5) rather than the original's two
/// independently bugged implementations.
pub fn check_balance(policy: &BalancePolicy, white_len: usize, black_len: usize) -> Result<()> {
    match policy {
        BalancePolicy::ToleratedDifference(max_diff) => {
            let diff = white_len.abs_diff(black_len);
            if diff > *max_diff as usize {
                return Err(Error::FailedPrecondition(format!(
                    "team size difference {diff} exceeds tolerated difference {max_diff}"
                )));
            }
        }
        BalancePolicy::TolerantFraction(fraction) => {
            let larger = white_len.max(black_len);
            let smaller = white_len.min(black_len);
            if smaller == 0 {
                // a team with zero members always accepts its first joiner
                return Ok(());
            }
            let limit = ((smaller as f64) * (1.0 + fraction)).ceil() as usize;
            if larger > limit {
                return Err(Error::FailedPrecondition(format!(
                    "larger team size {larger} exceeds tolerated limit {limit} for fraction {fraction}"
                )));
            }
        }
    }
    Ok(())
}

/// `Initialize` rejects a rules set that sets neither balance variant
/// meaningfully: a zero tolerated-difference-free policy never occurs
/// structurally (the enum always carries one), so this only guards the
/// fraction variant's `>0` requirement.
pub fn validate_policy(policy: &BalancePolicy) -> Result<()> {
    if let BalancePolicy::TolerantFraction(fraction) = policy {
        if *fraction <= 0.0 {
            return Err(Error::InvalidArgument(
                "tolerant fraction must be > 0".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerated_difference_allows_equal_and_one_off_teams() {
        let policy = BalancePolicy::ToleratedDifference(1);
        assert!(check_balance(&policy, 4, 4).is_ok());
        assert!(check_balance(&policy, 4, 5).is_ok());
        assert!(check_balance(&policy, 4, 6).is_err());
    }

    #[test]
    fn tolerant_fraction_allows_first_joiner_on_an_empty_team() {
        let policy = BalancePolicy::TolerantFraction(0.25);
        assert!(check_balance(&policy, 1, 0).is_ok());
        assert!(check_balance(&policy, 2, 1).is_ok());
        assert!(check_balance(&policy, 3, 1).is_err());
    }

    #[test]
    fn rejects_a_non_positive_fraction_at_validation() {
        assert!(validate_policy(&BalancePolicy::TolerantFraction(0.0)).is_err());
        assert!(validate_policy(&BalancePolicy::ToleratedDifference(1)).is_ok());
    }
}
