use alloy::primitives::{
    utils::{format_units, parse_units},
    U256,
};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::fmt;

use crate::error::{DemoError, DemoResult};

pub const ETHER_DECIMALS: u8 = 18;

/// An integer amount in the smallest unit together with the number of
/// decimals used to display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub value: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn ether(wei: U256) -> Self {
        Self::new(wei, ETHER_DECIMALS)
    }

    /// Parses a display-unit decimal string ("1", "0.5", "2560196682.0")
    /// into the smallest unit. Anything that does not fit exactly is rejected.
    pub fn parse(display: &str, decimals: u8) -> DemoResult<Self> {
        let display = display.trim();
        if display.is_empty() {
            return Err(DemoError::Conversion("amount cannot be empty".to_string()));
        }
        if display.starts_with('-') {
            return Err(DemoError::Conversion(format!(
                "amount '{}' must not be negative",
                display
            )));
        }

        let parsed = parse_units(display, decimals)
            .map_err(|e| DemoError::Conversion(format!("'{}': {}", display, e)))?;

        Ok(Self::new(parsed.into(), decimals))
    }

    /// Renders the amount in display units. Trailing fractional zeros are
    /// dropped, keeping at least one digit after the point.
    pub fn format(&self) -> DemoResult<String> {
        if self.decimals == 0 {
            return Ok(self.value.to_string());
        }

        let formatted = format_units(self.value, self.decimals)
            .map_err(|e| DemoError::Conversion(e.to_string()))?;

        Ok(trim_fraction(&formatted))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{} (10^-{})", self.value, self.decimals),
        }
    }
}

/// Serialized as the raw integer and the display form, both as decimal
/// strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Amount", 3)?;
        state.serialize_field("raw", &self.value.to_string())?;
        state.serialize_field("formatted", &self.to_string())?;
        state.serialize_field("decimals", &self.decimals)?;
        state.end()
    }
}

/// `serialize_with` helper writing a `U256` as a decimal string.
pub fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_matches_client_library_style() {
        let balance = U256::from_str("23549600706125768371").unwrap();
        assert_eq!(Amount::ether(balance).format().unwrap(), "23.549600706125768371");
        assert_eq!(Amount::new(balance, 0).format().unwrap(), "23549600706125768371");

        let one_ether = U256::from(10u64).pow(U256::from(18));
        assert_eq!(Amount::ether(one_ether).to_string(), "1.0");
        assert_eq!(Amount::ether(U256::ZERO).to_string(), "0.0");

        let usdc = U256::from(2_560_196_682_000_000u64);
        assert_eq!(Amount::new(usdc, 6).to_string(), "2560196682.0");

        let supply = U256::from(51_194_364_995_322_178u64);
        assert_eq!(Amount::new(supply, 6).to_string(), "51194364995.322178");
    }

    #[test]
    fn test_parse_scales_by_decimals() {
        assert_eq!(
            Amount::parse("2", 6).unwrap().value,
            U256::from(2_000_000u64)
        );
        assert_eq!(
            Amount::parse("1", 18).unwrap().value,
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(Amount::parse("0.5", 1).unwrap().value, U256::from(5u64));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Amount::parse("", 18).is_err());
        assert!(Amount::parse("-1", 18).is_err());
        assert!(Amount::parse("abc", 18).is_err());
    }

    #[test]
    fn test_round_trip_is_exact() {
        let samples = [
            U256::ZERO,
            U256::from(1u64),
            U256::from(999_999u64),
            U256::from(1_000_000u64),
            U256::from_str("23549600706125768371").unwrap(),
            U256::from_str("115792089237316195423570985008687907853269984665640564039457").unwrap(),
            U256::from(u64::MAX),
        ];

        for decimals in [0u8, 1, 6, 8, 18, 30] {
            for value in samples {
                let amount = Amount::new(value, decimals);
                let shown = amount.format().unwrap();
                let back = Amount::parse(&shown, decimals).unwrap();
                assert_eq!(back.value, value, "{} with {} decimals", shown, decimals);
            }
        }
    }

    #[test]
    fn test_json_shows_raw_and_formatted() {
        let amount = Amount::ether(U256::from_str("23549600706125768371").unwrap());
        assert_eq!(
            serde_json::to_value(amount).unwrap(),
            serde_json::json!({
                "raw": "23549600706125768371",
                "formatted": "23.549600706125768371",
                "decimals": 18
            })
        );
    }
}
