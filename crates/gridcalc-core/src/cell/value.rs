//! Cell value types

use std::fmt;

/// The computed value of a cell: a number or an error tag
///
/// Errors are a separate variant rather than a NaN sentinel so that the
/// originating error survives arithmetic.
///
/// With the `serde` feature a value serializes as a bare JSON number, or as a
/// string for error tags (`"#DIV/0"`) and non-finite numbers (`"inf"`,
/// `"-inf"`, `"NaN"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// Numeric value (IEEE-754 double; may be non-finite after overflow)
    Number(f64),

    /// Error value (#PARSE, #CYCLE, ...)
    Error(CellError),
}

impl CellValue {
    /// The value of an empty cell
    pub const ZERO: CellValue = CellValue::Number(0.0);

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Error(_) => None,
        }
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<CellError> {
        match self {
            CellValue::Error(e) => Some(*e),
            CellValue::Number(_) => None,
        }
    }

    /// Compare two values bit-for-bit (`NaN == NaN`, `0.0 != -0.0`).
    pub fn bitwise_eq(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Error(a), CellValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::ZERO
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

impl From<Result<f64, CellError>> for CellValue {
    fn from(result: Result<f64, CellError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

/// Error tags a cell can hold instead of a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #PARSE - Input is not a valid literal, formula, or empty
    Parse,
    /// #CYCLE - Cell participates in (or reads from) a dependency cycle
    Cycle,
    /// #DIV/0 - Nonzero value divided by zero
    DivByZero,
    /// #NAN - Zero divided by zero
    NaN,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Parse => "#PARSE",
            CellError::Cycle => "#CYCLE",
            CellError::DivByZero => "#DIV/0",
            CellError::NaN => "#NAN",
        }
    }

    /// Parse an error string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#PARSE" => Some(CellError::Parse),
            "#CYCLE" => Some(CellError::Cycle),
            "#DIV/0" => Some(CellError::DivByZero),
            "#NAN" => Some(CellError::NaN),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{CellError, CellValue};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    fn non_finite_name(n: f64) -> &'static str {
        if n.is_nan() {
            "NaN"
        } else if n > 0.0 {
            "inf"
        } else {
            "-inf"
        }
    }

    impl Serialize for CellValue {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
                CellValue::Number(n) => serializer.serialize_str(non_finite_name(*n)),
                CellValue::Error(e) => serializer.serialize_str(e.as_str()),
            }
        }
    }

    impl<'de> Deserialize<'de> for CellValue {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Helper {
                Number(f64),
                Text(String),
            }

            match Helper::deserialize(deserializer)? {
                Helper::Number(n) => Ok(CellValue::Number(n)),
                Helper::Text(text) => match text.as_str() {
                    "inf" => Ok(CellValue::Number(f64::INFINITY)),
                    "-inf" => Ok(CellValue::Number(f64::NEG_INFINITY)),
                    "NaN" => Ok(CellValue::Number(f64::NAN)),
                    tag => CellError::from_str(tag)
                        .map(CellValue::Error)
                        .ok_or_else(|| D::Error::custom(format!("unknown cell value '{tag}'"))),
                },
            }
        }
    }

    impl Serialize for CellError {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.as_str())
        }
    }

    impl<'de> Deserialize<'de> for CellError {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let tag = String::deserialize(deserializer)?;
            CellError::from_str(&tag)
                .ok_or_else(|| D::Error::custom(format!("unknown error tag '{tag}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_tags() {
        for err in [
            CellError::Parse,
            CellError::Cycle,
            CellError::DivByZero,
            CellError::NaN,
        ] {
            assert_eq!(CellError::from_str(err.as_str()), Some(err));
        }
        assert_eq!(CellError::from_str("#div/0"), Some(CellError::DivByZero));
        assert_eq!(CellError::from_str("#VALUE!"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(15.0).to_string(), "15");
        assert_eq!(CellValue::Number(-2.5).to_string(), "-2.5");
        assert_eq!(CellValue::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(CellValue::Error(CellError::Cycle).to_string(), "#CYCLE");
    }

    #[test]
    fn test_bitwise_eq() {
        assert!(CellValue::Number(f64::NAN).bitwise_eq(&CellValue::Number(f64::NAN)));
        assert!(!CellValue::Number(0.0).bitwise_eq(&CellValue::Number(-0.0)));
        assert!(!CellValue::Number(0.0).bitwise_eq(&CellValue::Error(CellError::NaN)));
        assert!(CellValue::Error(CellError::Parse).bitwise_eq(&CellValue::Error(CellError::Parse)));
    }

    #[test]
    fn test_from_result() {
        assert_eq!(CellValue::from(Ok(1.5)), CellValue::Number(1.5));
        assert_eq!(
            CellValue::from(Err(CellError::DivByZero)),
            CellValue::Error(CellError::DivByZero)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_uses_external_value_format() {
        let values = [
            CellValue::Number(15.0),
            CellValue::Number(-2.5),
            CellValue::Error(CellError::Cycle),
            CellValue::Error(CellError::DivByZero),
            CellValue::Number(f64::INFINITY),
            CellValue::Number(f64::NEG_INFINITY),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r##"[15.0,-2.5,"#CYCLE","#DIV/0","inf","-inf"]"##);

        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);

        let nan: CellValue = serde_json::from_str(r#""NaN""#).unwrap();
        assert!(nan.as_number().unwrap().is_nan());
        assert_eq!(serde_json::to_string(&nan).unwrap(), r#""NaN""#);

        assert!(serde_json::from_str::<CellValue>(r##""#VALUE!""##).is_err());
        assert_eq!(
            serde_json::to_string(&CellError::NaN).unwrap(),
            r##""#NAN""##
        );
    }
}
