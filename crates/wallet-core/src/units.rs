//! Lossless conversion between human-readable decimal amounts and integer
//! base units (satoshi, wei, arbitrary ERC-20 decimals).
//!
//! Amounts move through the engine as base-10 numeral strings; shifting the
//! decimal point is pure string surgery, so no floating-point rounding can
//! ever creep into a balance or an output value.

use crate::error::WalletError;

/// Moves the decimal point of `amount` by `places` positions.
///
/// Positive `places` shifts the point right (human units -> base units),
/// negative shifts it left. The result is normalized: no leading zeros on the
/// integer part, no trailing zeros on the fractional part, and a bare `0`
/// integer part in front of the dot.
///
/// `amount` must be a non-negative decimal numeral: ASCII digits with at most
/// one dot and no sign. Anything else is `InvalidNumber`.
pub fn shift_dot(amount: &str, places: i32) -> Result<String, WalletError> {
    let (int_part, frac_part) = split_numeral(amount)?;
    if places == 0 {
        return Ok(normalize(int_part, frac_part));
    }

    if places > 0 {
        let n = places as usize;
        if n >= frac_part.len() {
            // All fractional digits consumed; pad with zeros.
            let mut t = String::with_capacity(int_part.len() + n);
            t.push_str(int_part);
            t.push_str(frac_part);
            t.extend(std::iter::repeat('0').take(n - frac_part.len()));
            Ok(normalize(&t, ""))
        } else {
            let mut t = String::with_capacity(int_part.len() + n);
            t.push_str(int_part);
            t.push_str(&frac_part[..n]);
            Ok(normalize(&t, &frac_part[n..]))
        }
    } else {
        let n = (-places) as usize;
        if n >= int_part.len() {
            let mut f = String::with_capacity(n + frac_part.len());
            f.extend(std::iter::repeat('0').take(n - int_part.len()));
            f.push_str(int_part);
            f.push_str(frac_part);
            Ok(normalize("0", &f))
        } else {
            let cut = int_part.len() - n;
            let mut f = String::with_capacity(n + frac_part.len());
            f.push_str(&int_part[cut..]);
            f.push_str(frac_part);
            Ok(normalize(&int_part[..cut], &f))
        }
    }
}

/// Converts a human-readable decimal amount into an integer base-unit string.
///
/// `to_base_units("0.00022", 8) == "22000"`. The amount must carry at most
/// `decimals` significant fractional digits; finer precision than the target
/// unit can represent is `InvalidNumber` rather than silent truncation.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<String, WalletError> {
    let (_, frac_part) = split_numeral(amount)?;
    let significant = frac_part.trim_end_matches('0').len();
    if significant > decimals as usize {
        return Err(WalletError::InvalidNumber(format!(
            "{amount} has more than {decimals} fractional digits"
        )));
    }
    shift_dot(amount, decimals as i32)
}

/// Converts an integer base-unit string back into a human-readable decimal
/// amount.
///
/// `from_base_units("22000", 8) == "0.00022"`. The input must be a plain
/// integer numeral.
pub fn from_base_units(amount: &str, decimals: u32) -> Result<String, WalletError> {
    if amount.contains('.') {
        return Err(WalletError::InvalidNumber(format!(
            "base-unit amount must be an integer: {amount}"
        )));
    }
    shift_dot(amount, -(decimals as i32))
}

fn split_numeral(amount: &str) -> Result<(&str, &str), WalletError> {
    if amount.is_empty() {
        return Err(WalletError::InvalidNumber("empty amount".into()));
    }
    let mut parts = amount.split('.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err(WalletError::InvalidNumber(format!(
            "multiple decimal points in {amount}"
        )));
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(WalletError::InvalidNumber(amount.into()));
    }
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(int_part) || !digits_only(frac_part) {
        return Err(WalletError::InvalidNumber(amount.into()));
    }
    Ok((int_part, frac_part))
}

fn normalize(int_part: &str, frac_part: &str) -> String {
    let int_trimmed = int_part.trim_start_matches('0');
    let int_norm = if int_trimmed.is_empty() { "0" } else { int_trimmed };
    let frac_norm = frac_part.trim_end_matches('0');
    if frac_norm.is_empty() {
        int_norm.to_string()
    } else {
        format!("{int_norm}.{frac_norm}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btc_to_satoshi() {
        assert_eq!(to_base_units("0.00022", 8).unwrap(), "22000");
    }

    #[test]
    fn satoshi_to_btc() {
        assert_eq!(from_base_units("22000", 8).unwrap(), "0.00022");
    }

    #[test]
    fn eth_to_wei() {
        assert_eq!(to_base_units("1", 18).unwrap(), "1000000000000000000");
    }

    #[test]
    fn wei_to_eth() {
        assert_eq!(from_base_units("1000000000000000000", 18).unwrap(), "1");
    }

    #[test]
    fn round_trip_holds_for_expressible_values() {
        for (x, d) in [
            ("0.00022", 8u32),
            ("21000000", 8),
            ("1.5", 18),
            ("0.000000000000000001", 18),
            ("123.456", 6),
            ("0.1", 1),
        ] {
            let base = to_base_units(x, d).unwrap();
            assert_eq!(from_base_units(&base, d).unwrap(), x, "x={x} d={d}");
        }
    }

    #[test]
    fn zero_decimals_is_identity_on_integers() {
        assert_eq!(to_base_units("42", 0).unwrap(), "42");
        assert_eq!(from_base_units("42", 0).unwrap(), "42");
    }

    #[test]
    fn zero_value() {
        assert_eq!(to_base_units("0", 8).unwrap(), "0");
        assert_eq!(from_base_units("0", 8).unwrap(), "0");
        assert_eq!(to_base_units("0.0", 8).unwrap(), "0");
    }

    #[test]
    fn trailing_fractional_zeros_are_tolerated() {
        // Nine written digits but only five significant ones.
        assert_eq!(to_base_units("0.000220000", 8).unwrap(), "22000");
    }

    #[test]
    fn excess_precision_is_rejected() {
        let err = to_base_units("0.123456789", 8).unwrap_err();
        assert!(matches!(err, WalletError::InvalidNumber(_)));
    }

    #[test]
    fn multi_dot_is_rejected() {
        assert!(matches!(
            shift_dot("1.2.3", 8),
            Err(WalletError::InvalidNumber(_))
        ));
    }

    #[test]
    fn non_numeric_is_rejected() {
        for bad in ["", ".", "abc", "1,5", "-1", "+2", "0x10", "1e8"] {
            assert!(
                matches!(shift_dot(bad, 8), Err(WalletError::InvalidNumber(_))),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn fractional_base_units_rejected() {
        assert!(from_base_units("12.5", 8).is_err());
    }

    #[test]
    fn shift_left_pads_with_zeros() {
        assert_eq!(shift_dot("7", -3).unwrap(), "0.007");
    }

    #[test]
    fn shift_right_across_the_dot() {
        assert_eq!(shift_dot("1.234", 2).unwrap(), "123.4");
    }

    #[test]
    fn shift_normalizes_leading_zeros() {
        assert_eq!(shift_dot("000.00022", 8).unwrap(), "22000");
    }

    #[test]
    fn large_token_amounts() {
        // More digits than any machine integer holds; strings keep it exact.
        let supply = "91000000000000000000000000000";
        let human = from_base_units(supply, 18).unwrap();
        assert_eq!(human, "91000000000");
        assert_eq!(to_base_units(&human, 18).unwrap(), supply);
    }
}
