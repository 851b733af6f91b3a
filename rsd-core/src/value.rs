//! Runtime values with syntactic typing.
//!
//! The wire grammar determines the type, not value sniffing: a numeric
//! literal is a float iff it carries a decimal point or exponent marker,
//! an integer otherwise. These types are stable and hand-written.

/// A decoded positional value.
///
/// Arrays are homogeneous; nesting is bounded at one level (arrays of
/// scalars, never arrays of arrays) and enforced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer literal: `42`, `-17`
    Integer(i32),

    /// Float literal: `3.14`, `1.5e-3`
    Float(f64),

    /// Quoted string literal (already unescaped)
    String(String),

    /// Bracketed array: `[1 2 3]`
    Array(Vec<Value>),
}

impl Value {
    /// Try to get as integer.
    #[inline]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float, promoting integers.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as array slice.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of this value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }
}

/// A decoded parameter payload: one homogeneous scalar array.
///
/// Aggregate element types (point, color, matrix, ...) decode into the
/// float payload at components-per-element granularity.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValues {
    Integers(Vec<i32>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
}

impl ParamValues {
    /// Number of scalars in the payload.
    pub fn len(&self) -> usize {
        match self {
            Self::Integers(v) => v.len(),
            Self::Floats(v) => v.len(),
            Self::Strings(v) => v.len(),
        }
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try to get as float slice.
    #[inline]
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as integer slice.
    #[inline]
    pub fn as_integers(&self) -> Option<&[i32]> {
        match self {
            Self::Integers(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as string slice.
    #[inline]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(v) => Some(v),
            _ => None,
        }
    }
}

/// A scanned numeric literal, classified but not yet ranged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i32),
    Float(f64),
}

/// Parse a byte slice as a numeric literal.
///
/// Float iff the bytes contain `.`, `e`, or `E`; integer otherwise.
/// Returns `None` for anything that does not scan, including integer
/// overflow.
pub fn parse_number(bytes: &[u8]) -> Option<Number> {
    if bytes.is_empty() {
        return None;
    }

    if bytes.iter().any(|&b| b == b'.' || b == b'e' || b == b'E') {
        return parse_float(bytes).map(Number::Float);
    }

    let (negative, rest) = match bytes.first() {
        Some(&b'-') => (true, &bytes[1..]),
        Some(&b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    parse_decimal(negative, rest).map(Number::Integer)
}

fn parse_decimal(negative: bool, bytes: &[u8]) -> Option<i32> {
    if bytes.is_empty() {
        return None;
    }

    // Accumulate wide so i32::MIN survives the negate.
    let mut result: i64 = 0;
    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                result = result.checked_mul(10)?.checked_add((b - b'0') as i64)?;
            }
            _ => return None,
        }
    }

    if negative {
        result = -result;
    }

    i32::try_from(result).ok()
}

fn parse_float(bytes: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(bytes).ok()?;
    // Reject forms f64::from_str tolerates but the grammar does not.
    if s.ends_with('.') && s.len() == 1 {
        return None;
    }
    let value: f64 = s.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_literals() {
        assert_eq!(parse_number(b"42"), Some(Number::Integer(42)));
        assert_eq!(parse_number(b"0"), Some(Number::Integer(0)));
        assert_eq!(parse_number(b"-17"), Some(Number::Integer(-17)));
        assert_eq!(parse_number(b"+8"), Some(Number::Integer(8)));
        assert_eq!(parse_number(b"-2147483648"), Some(Number::Integer(i32::MIN)));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(parse_number(b"3.14"), Some(Number::Float(3.14)));
        assert_eq!(parse_number(b"1.5e-3"), Some(Number::Float(0.0015)));
        assert_eq!(parse_number(b"-2.5"), Some(Number::Float(-2.5)));
        assert_eq!(parse_number(b"1E2"), Some(Number::Float(100.0)));
        // Decimal point alone forces float classification
        assert_eq!(parse_number(b"2."), Some(Number::Float(2.0)));
        assert_eq!(parse_number(b".5"), Some(Number::Float(0.5)));
    }

    #[test]
    fn test_rejects() {
        assert_eq!(parse_number(b""), None);
        assert_eq!(parse_number(b"-"), None);
        assert_eq!(parse_number(b"12x"), None);
        assert_eq!(parse_number(b"1.2.3"), None);
        // i32 overflow is a scan failure, not silent wrap
        assert_eq!(parse_number(b"4294967296"), None);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_integer(), None);
        assert_eq!(Value::String("fog".to_string()).as_str(), Some("fog"));
        let arr = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(arr.as_array().map(|a| a.len()), Some(2));
        assert_eq!(arr.kind_name(), "array");
    }

    #[test]
    fn test_param_values_len() {
        assert_eq!(ParamValues::Floats(vec![1.0, 2.0]).len(), 2);
        assert!(ParamValues::Strings(vec![]).is_empty());
    }
}
