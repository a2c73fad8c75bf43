use once_cell::sync::Lazy;
use regex::Regex;

use super::trait_def::DecisionError;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").expect("integer regex is valid"));

/// Extract an order quantity from free-form model output.
///
/// The first integer token wins. Negative numbers, text without digits and
/// values that overflow `u32` are rejected.
pub fn parse_order_quantity(text: &str) -> Result<u32, DecisionError> {
    let token = INTEGER
        .find(text)
        .ok_or_else(|| DecisionError::InvalidResponse(format!("no number in {text:?}")))?;
    let value: i64 = token
        .as_str()
        .parse()
        .map_err(|_| DecisionError::InvalidResponse(format!("number out of range in {text:?}")))?;
    if value < 0 {
        return Err(DecisionError::InvalidResponse(format!(
            "negative order {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| DecisionError::InvalidResponse(format!("order {value} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_integer() {
        assert_eq!(parse_order_quantity("8").unwrap(), 8);
        assert_eq!(parse_order_quantity("  12\n").unwrap(), 12);
        assert_eq!(parse_order_quantity("I would order 16 units, maybe 20").unwrap(), 16);
    }

    #[test]
    fn rejects_negative_and_missing() {
        assert!(matches!(
            parse_order_quantity("-4"),
            Err(DecisionError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_order_quantity("order as many as possible"),
            Err(DecisionError::InvalidResponse(_))
        ));
        assert!(parse_order_quantity("99999999999").is_err());
    }
}
