//! YANG base types and typed leaf values.
//!
//! A leaf body is plain text on the wire; the comparator and the JSON codec
//! both need it as a typed scalar. [`BaseType`] is the resolved base kind of
//! a statement's `type`, [`TypedValue`] is a parsed body under that kind.

use std::cmp::Ordering;

use crate::error::Error;

/// Resolved base kind of a YANG `type` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Boolean,
    Empty,
    String,
    Identityref,
    Enumeration,
    Union,
    /// A type name the engine does not interpret; treated as a string.
    Other(String),
}

impl BaseType {
    /// Maps a `type` statement argument to its base kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "int8" => BaseType::Int8,
            "int16" => BaseType::Int16,
            "int32" => BaseType::Int32,
            "int64" => BaseType::Int64,
            "uint8" => BaseType::Uint8,
            "uint16" => BaseType::Uint16,
            "uint32" => BaseType::Uint32,
            "uint64" => BaseType::Uint64,
            "decimal64" => BaseType::Decimal64,
            "boolean" => BaseType::Boolean,
            "empty" => BaseType::Empty,
            "string" => BaseType::String,
            "identityref" => BaseType::Identityref,
            "enumeration" => BaseType::Enumeration,
            "union" => BaseType::Union,
            other => BaseType::Other(other.to_string()),
        }
    }

    /// True if JSON encodes values of this kind without quotes.
    pub fn json_unquoted(&self) -> bool {
        matches!(
            self,
            BaseType::Int8
                | BaseType::Int16
                | BaseType::Int32
                | BaseType::Int64
                | BaseType::Uint8
                | BaseType::Uint16
                | BaseType::Uint32
                | BaseType::Uint64
                | BaseType::Decimal64
                | BaseType::Boolean
        )
    }
}

/// A resolved leaf type: base kind plus the `fraction-digits` count for
/// `decimal64` (1..=18, unused otherwise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub base: BaseType,
    pub fraction_digits: u8,
}

impl ResolvedType {
    pub fn new(base: BaseType) -> Self {
        ResolvedType {
            base,
            fraction_digits: 0,
        }
    }
}

/// A `decimal64` value: digits scaled by `10^fraction_digits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal64 {
    /// Scaled integer value.
    pub value: i64,
    /// Number of fraction digits (1..=18).
    pub fraction_digits: u8,
}

impl Decimal64 {
    /// Compares two decimals honoring their fractional scale.
    fn cmp_scaled(&self, other: &Decimal64) -> Ordering {
        let a = self.value as i128 * 10i128.pow(other.fraction_digits as u32);
        let b = other.value as i128 * 10i128.pow(self.fraction_digits as u32);
        a.cmp(&b)
    }
}

impl std::fmt::Display for Decimal64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scale = 10i64.pow(self.fraction_digits as u32);
        let int = self.value / scale;
        let frac = (self.value % scale).abs();
        let sign = if self.value < 0 && int == 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            int,
            frac,
            width = self.fraction_digits as usize
        )
    }
}

/// A typed leaf body value.
///
/// The order of the variants matters: values of different kinds (possible
/// with `union`-typed leaf-lists) order by variant rank so the sibling
/// comparator stays total.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Empty,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Decimal(Decimal64),
    Str(String),
}

impl TypedValue {
    fn rank(&self) -> u8 {
        match self {
            TypedValue::Empty => 0,
            TypedValue::Bool(_) => 1,
            TypedValue::Int(_) => 2,
            TypedValue::Uint(_) => 3,
            TypedValue::Decimal(_) => 4,
            TypedValue::Str(_) => 5,
        }
    }

    /// Total order over typed values: numerics numeric, booleans
    /// false < true, strings by code point, `empty` equal to itself.
    pub fn cmp_value(&self, other: &TypedValue) -> Ordering {
        match (self, other) {
            (TypedValue::Empty, TypedValue::Empty) => Ordering::Equal,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a.cmp(b),
            (TypedValue::Int(a), TypedValue::Int(b)) => a.cmp(b),
            (TypedValue::Uint(a), TypedValue::Uint(b)) => a.cmp(b),
            (TypedValue::Decimal(a), TypedValue::Decimal(b)) => a.cmp_scaled(b),
            (TypedValue::Str(a), TypedValue::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Empty => Ok(()),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Uint(u) => write!(f, "{}", u),
            TypedValue::Decimal(d) => write!(f, "{}", d),
            TypedValue::Str(s) => write!(f, "{}", s),
        }
    }
}

fn parse_err(field: &str, reason: impl Into<String>) -> Error {
    Error::ValueParse {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn parse_int_range(text: &str, min: i64, max: i64) -> Result<i64, Error> {
    let v: i64 = text
        .trim()
        .parse()
        .map_err(|e| parse_err(text, format!("not an integer: {}", e)))?;
    if v < min || v > max {
        return Err(parse_err(text, format!("out of range [{}, {}]", min, max)));
    }
    Ok(v)
}

fn parse_uint_range(text: &str, max: u64) -> Result<u64, Error> {
    let v: u64 = text
        .trim()
        .parse()
        .map_err(|e| parse_err(text, format!("not an unsigned integer: {}", e)))?;
    if v > max {
        return Err(parse_err(text, format!("out of range [0, {}]", max)));
    }
    Ok(v)
}

/// Parses a `decimal64` body with the given fraction-digit count.
fn parse_decimal64(text: &str, fraction_digits: u8) -> Result<Decimal64, Error> {
    if !(1..=18).contains(&fraction_digits) {
        return Err(parse_err(
            text,
            format!("invalid fraction-digits {}", fraction_digits),
        ));
    }
    let t = text.trim();
    let (int_part, frac_part) = match t.split_once('.') {
        Some((i, f)) => (i, f),
        None => (t, ""),
    };
    if frac_part.len() > fraction_digits as usize {
        return Err(parse_err(
            text,
            format!("more than {} fraction digits", fraction_digits),
        ));
    }
    let negative = int_part.starts_with('-');
    let int: i64 = if int_part.is_empty() || int_part == "-" {
        0
    } else {
        int_part
            .parse()
            .map_err(|e| parse_err(text, format!("not a decimal: {}", e)))?
    };
    let mut frac: i64 = 0;
    if !frac_part.is_empty() {
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(parse_err(text, "not a decimal"));
        }
        frac = frac_part
            .parse()
            .map_err(|e| parse_err(text, format!("not a decimal: {}", e)))?;
        frac *= 10i64.pow(fraction_digits as u32 - frac_part.len() as u32);
    }
    let scale = 10i64.pow(fraction_digits as u32);
    let value = int
        .checked_mul(scale)
        .and_then(|v| {
            if negative {
                v.checked_sub(frac)
            } else {
                v.checked_add(frac)
            }
        })
        .ok_or_else(|| parse_err(text, "decimal overflow"))?;
    Ok(Decimal64 {
        value,
        fraction_digits,
    })
}

/// Parses a body string under a resolved type.
///
/// `empty` accepts only an empty body. Types the engine does not interpret
/// (`identityref`, `enumeration`, `union`, unknown names) parse as strings;
/// they compare by code point, which is what the sibling comparator needs.
pub fn parse_value(text: &str, ty: &ResolvedType) -> Result<TypedValue, Error> {
    match &ty.base {
        BaseType::Int8 => parse_int_range(text, i8::MIN as i64, i8::MAX as i64).map(TypedValue::Int),
        BaseType::Int16 => {
            parse_int_range(text, i16::MIN as i64, i16::MAX as i64).map(TypedValue::Int)
        }
        BaseType::Int32 => {
            parse_int_range(text, i32::MIN as i64, i32::MAX as i64).map(TypedValue::Int)
        }
        BaseType::Int64 => parse_int_range(text, i64::MIN, i64::MAX).map(TypedValue::Int),
        BaseType::Uint8 => parse_uint_range(text, u8::MAX as u64).map(TypedValue::Uint),
        BaseType::Uint16 => parse_uint_range(text, u16::MAX as u64).map(TypedValue::Uint),
        BaseType::Uint32 => parse_uint_range(text, u32::MAX as u64).map(TypedValue::Uint),
        BaseType::Uint64 => parse_uint_range(text, u64::MAX).map(TypedValue::Uint),
        BaseType::Decimal64 => parse_decimal64(text, ty.fraction_digits).map(TypedValue::Decimal),
        BaseType::Boolean => match text.trim() {
            "true" => Ok(TypedValue::Bool(true)),
            "false" => Ok(TypedValue::Bool(false)),
            _ => Err(parse_err(text, "not a boolean")),
        },
        BaseType::Empty => {
            if text.is_empty() {
                Ok(TypedValue::Empty)
            } else {
                Err(parse_err(text, "empty type takes no value"))
            }
        }
        BaseType::String
        | BaseType::Identityref
        | BaseType::Enumeration
        | BaseType::Union
        | BaseType::Other(_) => Ok(TypedValue::Str(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_from_name() {
        assert_eq!(BaseType::from_name("uint32"), BaseType::Uint32);
        assert_eq!(BaseType::from_name("boolean"), BaseType::Boolean);
        assert_eq!(
            BaseType::from_name("inet:uri"),
            BaseType::Other("inet:uri".to_string())
        );
    }

    #[test]
    fn test_json_unquoted() {
        assert!(BaseType::Uint8.json_unquoted());
        assert!(BaseType::Decimal64.json_unquoted());
        assert!(BaseType::Boolean.json_unquoted());
        assert!(!BaseType::String.json_unquoted());
        assert!(!BaseType::Identityref.json_unquoted());
    }

    #[test]
    fn test_parse_int_bounds() {
        let ty = ResolvedType::new(BaseType::Int8);
        assert_eq!(parse_value("127", &ty).unwrap(), TypedValue::Int(127));
        assert_eq!(parse_value("-128", &ty).unwrap(), TypedValue::Int(-128));
        assert!(parse_value("128", &ty).is_err());
        assert!(parse_value("abc", &ty).is_err());
    }

    #[test]
    fn test_parse_uint() {
        let ty = ResolvedType::new(BaseType::Uint16);
        assert_eq!(parse_value("65535", &ty).unwrap(), TypedValue::Uint(65535));
        assert!(parse_value("65536", &ty).is_err());
        assert!(parse_value("-1", &ty).is_err());
    }

    #[test]
    fn test_parse_decimal64() {
        let ty = ResolvedType {
            base: BaseType::Decimal64,
            fraction_digits: 2,
        };
        let v = parse_value("3.14", &ty).unwrap();
        assert_eq!(
            v,
            TypedValue::Decimal(Decimal64 {
                value: 314,
                fraction_digits: 2
            })
        );
        assert_eq!(v.to_string(), "3.14");
        let v = parse_value("-0.5", &ty).unwrap();
        assert_eq!(v.to_string(), "-0.50");
        assert!(parse_value("3.145", &ty).is_err());
    }

    #[test]
    fn test_decimal_cmp_across_scales() {
        let a = TypedValue::Decimal(Decimal64 {
            value: 150,
            fraction_digits: 2,
        }); // 1.50
        let b = TypedValue::Decimal(Decimal64 {
            value: 1500,
            fraction_digits: 3,
        }); // 1.500
        let c = TypedValue::Decimal(Decimal64 {
            value: 1501,
            fraction_digits: 3,
        }); // 1.501
        assert_eq!(a.cmp_value(&b), Ordering::Equal);
        assert_eq!(a.cmp_value(&c), Ordering::Less);
    }

    #[test]
    fn test_numeric_not_lexical() {
        let ty = ResolvedType::new(BaseType::Uint32);
        let two = parse_value("2", &ty).unwrap();
        let ten = parse_value("10", &ty).unwrap();
        // "10" < "2" lexically, but 2 < 10 numerically
        assert_eq!(two.cmp_value(&ten), Ordering::Less);
    }

    #[test]
    fn test_bool_order() {
        assert_eq!(
            TypedValue::Bool(false).cmp_value(&TypedValue::Bool(true)),
            Ordering::Less
        );
    }

    #[test]
    fn test_empty() {
        let ty = ResolvedType::new(BaseType::Empty);
        assert_eq!(parse_value("", &ty).unwrap(), TypedValue::Empty);
        assert!(parse_value("x", &ty).is_err());
        assert_eq!(
            TypedValue::Empty.cmp_value(&TypedValue::Empty),
            Ordering::Equal
        );
    }
}
