use {
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::fmt,
    std::str::FromStr,
};

/// Link amount as a decimal, scale preserved ("10.00" stays "10.00").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses the caller's amount string. Unparsable input becomes zero
    /// instead of failing the request; the raw string still goes to the processor.
    pub fn parse_lenient(raw: &str) -> Self {
        match Decimal::from_str(raw.trim()) {
            Ok(value) => Self(value),
            Err(e) => {
                tracing::warn!(amount = raw, error = %e, "unparsable amount, storing 0");
                Self(Decimal::ZERO)
            }
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
