//! Canonical JSON encoding for deterministic leaf hashing.
//!
//! Rules:
//! - Object keys sorted by their UTF-8 bytes
//! - Arrays keep their order
//! - Strings use standard JSON escaping, non-ASCII stays literal
//! - Integers are minimal decimal
//! - Decimals use the shortest round-trip digits laid out the way
//!   ECMAScript's `Number.prototype.toString` lays them out
//! - No insignificant whitespace
//!
//! The encoding feeds leaf hashing only. Changing it changes every root.

use std::collections::BTreeMap;

use serde::ser;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::CanonicalizationError;

/// A value that can be canonically encoded.
///
/// Built once at the API boundary; every variant encodes uniformly after that.
/// `BTreeMap<String, _>` iterates in byte order, which is the canonical key order.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    String(String),
    Integer(i128),
    Decimal(f64),
    Array(Vec<CanonicalValue>),
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Convert a JSON value.
    pub fn from_json(value: &Value) -> Result<Self, CanonicalizationError> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::String(s) => Self::String(s.clone()),
            Value::Number(n) => Self::from_number(n)?,
            Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(map) => {
                let mut entries = BTreeMap::new();
                for (key, item) in map {
                    entries.insert(key.clone(), Self::from_json(item)?);
                }
                Self::Object(entries)
            }
        })
    }

    /// Convert any serializable value, following serde_json's data model.
    ///
    /// Fails for non-finite floats, raw byte blobs and maps whose keys are
    /// not strings or integers.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, CanonicalizationError> {
        value.serialize(ValueSerializer)
    }

    /// A decimal number. Fails for NaN and infinities.
    pub fn decimal(value: f64) -> Result<Self, CanonicalizationError> {
        if !value.is_finite() {
            return Err(CanonicalizationError::NonFiniteNumber);
        }
        Ok(Self::Decimal(value))
    }

    fn from_number(n: &Number) -> Result<Self, CanonicalizationError> {
        if let Some(i) = n.as_i64() {
            return Ok(Self::Integer(i.into()));
        }
        if let Some(u) = n.as_u64() {
            return Ok(Self::Integer(u.into()));
        }
        match n.as_f64() {
            Some(f) => Self::decimal(f),
            None => Err(CanonicalizationError::UnrepresentableNumber(n.to_string())),
        }
    }

    /// Encode to canonical bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CanonicalizationError> {
        let mut buf = Vec::new();
        encode_value_to(&mut buf, self)?;
        Ok(buf)
    }
}

impl TryFrom<&Value> for CanonicalValue {
    type Error = CanonicalizationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

/// Canonical bytes of a JSON value.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    CanonicalValue::from_json(value)?.encode()
}

/// Canonical bytes of any serializable value.
pub fn canonical_bytes_of<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalizationError> {
    CanonicalValue::from_serialize(value)?.encode()
}

/// Canonical encoding as a UTF-8 string.
pub fn canonical_string(value: &Value) -> Result<String, CanonicalizationError> {
    let bytes = canonical_bytes(value)?;
    String::from_utf8(bytes).map_err(|e| CanonicalizationError::Unsupported(e.to_string()))
}

fn encode_value_to(buf: &mut Vec<u8>, value: &CanonicalValue) -> Result<(), CanonicalizationError> {
    match value {
        CanonicalValue::Null => buf.extend_from_slice(b"null"),
        CanonicalValue::Bool(true) => buf.extend_from_slice(b"true"),
        CanonicalValue::Bool(false) => buf.extend_from_slice(b"false"),
        CanonicalValue::String(s) => encode_string(buf, s),
        CanonicalValue::Integer(i) => buf.extend_from_slice(i.to_string().as_bytes()),
        CanonicalValue::Decimal(f) => buf.extend_from_slice(format_decimal(*f)?.as_bytes()),
        CanonicalValue::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode_value_to(buf, item)?;
            }
            buf.push(b']');
        }
        CanonicalValue::Object(entries) => {
            buf.push(b'{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode_string(buf, key);
                buf.push(b':');
                encode_value_to(buf, item)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

fn encode_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{08}' => buf.extend_from_slice(b"\\b"),
            '\u{0c}' => buf.extend_from_slice(b"\\f"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                buf.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut tmp = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

/// Lay out the shortest round-trip digits of `value`.
///
/// Plain notation when the decimal exponent is in `[-6, 21)`, otherwise
/// `d.ddde±x`. Negative zero renders as `0`.
fn format_decimal(value: f64) -> Result<String, CanonicalizationError> {
    if !value.is_finite() {
        return Err(CanonicalizationError::NonFiniteNumber);
    }
    if value == 0.0 {
        return Ok("0".to_string());
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "1.2345e-7".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .ok_or_else(|| CanonicalizationError::UnrepresentableNumber(scientific.clone()))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|_| CanonicalizationError::UnrepresentableNumber(scientific.clone()))?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    // k significant digits, decimal point after position n.
    let k = digits.len() as i32;
    let n = exponent + 1;

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if n - 1 > 0 { '+' } else { '-' });
        out.push_str(&(n - 1).abs().to_string());
    }

    Ok(out)
}

/// Builds a [`CanonicalValue`] straight from serde, without an intermediate
/// `serde_json::Value` (which would turn NaN into `null`).
struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = MapBuilder;

    fn serialize_bool(self, v: bool) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Integer(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<CanonicalValue, CanonicalizationError> {
        i128::try_from(v)
            .map(CanonicalValue::Integer)
            .map_err(|_| CanonicalizationError::UnrepresentableNumber(v.to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<CanonicalValue, CanonicalizationError> {
        CanonicalValue::decimal(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<CanonicalValue, CanonicalizationError> {
        CanonicalValue::decimal(v)
    }

    fn serialize_char(self, v: char) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::String(v.to_owned()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<CanonicalValue, CanonicalizationError> {
        Err(CanonicalizationError::Unsupported(
            "raw bytes have no canonical form".into(),
        ))
    }

    fn serialize_none(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(
        self,
        value: &T,
    ) -> Result<CanonicalValue, CanonicalizationError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(CanonicalValue::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<CanonicalValue, CanonicalizationError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(tagged(Some(variant), value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, CanonicalizationError> {
        Ok(SeqBuilder::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, CanonicalizationError> {
        Ok(SeqBuilder::new(None, len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, CanonicalizationError> {
        Ok(SeqBuilder::new(None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, CanonicalizationError> {
        Ok(SeqBuilder::new(Some(variant), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder, CanonicalizationError> {
        Ok(MapBuilder::new(None))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<MapBuilder, CanonicalizationError> {
        Ok(MapBuilder::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<MapBuilder, CanonicalizationError> {
        Ok(MapBuilder::new(Some(variant)))
    }
}

/// Externally tagged enum variants become `{"Variant": value}`.
fn tagged(variant: Option<&'static str>, value: CanonicalValue) -> CanonicalValue {
    match variant {
        Some(name) => CanonicalValue::Object(BTreeMap::from([(name.to_owned(), value)])),
        None => value,
    }
}

struct SeqBuilder {
    variant: Option<&'static str>,
    items: Vec<CanonicalValue>,
}

impl SeqBuilder {
    fn new(variant: Option<&'static str>, len: usize) -> Self {
        Self {
            variant,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn finish(self) -> CanonicalValue {
        tagged(self.variant, CanonicalValue::Array(self.items))
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        self.push(value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        self.push(value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        self.push(value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        self.push(value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

struct MapBuilder {
    variant: Option<&'static str>,
    entries: BTreeMap<String, CanonicalValue>,
    pending_key: Option<String>,
}

impl MapBuilder {
    fn new(variant: Option<&'static str>) -> Self {
        Self {
            variant,
            entries: BTreeMap::new(),
            pending_key: None,
        }
    }

    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<(), CanonicalizationError> {
        self.entries.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn finish(self) -> CanonicalValue {
        tagged(self.variant, CanonicalValue::Object(self.entries))
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), CanonicalizationError> {
        // Integer and bool keys take their JSON text form, as in serde_json.
        let key = match key.serialize(ValueSerializer)? {
            CanonicalValue::String(s) => s,
            CanonicalValue::Integer(i) => i.to_string(),
            CanonicalValue::Bool(b) => b.to_string(),
            _ => {
                return Err(CanonicalizationError::Unsupported(
                    "map key must be a string".into(),
                ))
            }
        };
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CanonicalizationError> {
        let key = self.pending_key.take().ok_or_else(|| {
            CanonicalizationError::Unsupported("map value without a key".into())
        })?;
        self.insert(key, value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CanonicalizationError> {
        self.insert(key.to_owned(), value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for MapBuilder {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CanonicalizationError> {
        self.insert(key.to_owned(), value)
    }

    fn end(self) -> Result<CanonicalValue, CanonicalizationError> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn canon(value: Value) -> String {
        canonical_string(&value).unwrap()
    }

    #[test]
    fn test_object_keys_sorted() {
        assert_eq!(canonical_bytes(&json!({"b": 2, "a": 1})).unwrap(), br#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_key_order_is_bytewise() {
        // Uppercase sorts before lowercase; multi-byte UTF-8 sorts last.
        assert_eq!(
            canon(json!({"a": 0, "é": 1, "B": 2, "z": 3})),
            r#"{"B":2,"a":0,"z":3,"é":1}"#
        );
    }

    #[test]
    fn test_nested_structures() {
        let value = json!({"b": 2, "a": 1, "nested": {"z": [1, "x", null, true], "y": false}});
        assert_eq!(
            canon(value),
            r#"{"a":1,"b":2,"nested":{"y":false,"z":[1,"x",null,true]}}"#
        );
    }

    #[test]
    fn test_array_order_preserved() {
        assert_eq!(canon(json!([3, 1, 2])), "[3,1,2]");
        assert_eq!(canon(json!([])), "[]");
        assert_eq!(canon(json!({})), "{}");
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut first = serde_json::Map::new();
        first.insert("x".into(), json!(1));
        first.insert("y".into(), json!(2));
        let mut second = serde_json::Map::new();
        second.insert("y".into(), json!(2));
        second.insert("x".into(), json!(1));

        assert_eq!(
            canonical_bytes(&Value::Object(first)).unwrap(),
            canonical_bytes(&Value::Object(second)).unwrap()
        );
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(canon(json!("a\"b\\c")), r#""a\"b\\c""#);
        assert_eq!(canon(json!("\n\r\t\u{08}\u{0c}")), r#""\n\r\t\b\f""#);
        assert_eq!(canon(json!("\u{01}\u{1f}")), r#""\u0001\u001f""#);
        assert_eq!(canon(json!("/")), r#""/""#);
        assert_eq!(canon(json!("héllo €")), "\"héllo €\"");
    }

    #[test]
    fn test_integers() {
        assert_eq!(canon(json!(0)), "0");
        assert_eq!(canon(json!(-42)), "-42");
        assert_eq!(canon(json!(u64::MAX)), "18446744073709551615");
        assert_eq!(canon(json!(i64::MIN)), "-9223372036854775808");
    }

    #[test]
    fn test_literals() {
        assert_eq!(canon(json!(null)), "null");
        assert_eq!(canon(json!(true)), "true");
        assert_eq!(canon(json!(false)), "false");
    }

    #[test]
    fn test_decimal_layout() {
        assert_eq!(format_decimal(1.5).unwrap(), "1.5");
        assert_eq!(format_decimal(0.1).unwrap(), "0.1");
        assert_eq!(format_decimal(-2.25).unwrap(), "-2.25");
        assert_eq!(format_decimal(100.0).unwrap(), "100");
        assert_eq!(format_decimal(-0.0).unwrap(), "0");
        assert_eq!(format_decimal(0.000001).unwrap(), "0.000001");
        assert_eq!(format_decimal(1e-7).unwrap(), "1e-7");
        assert_eq!(format_decimal(1.5e-7).unwrap(), "1.5e-7");
        assert_eq!(format_decimal(1e20).unwrap(), "100000000000000000000");
        assert_eq!(format_decimal(1e21).unwrap(), "1e+21");
        assert_eq!(format_decimal(1.2345e25).unwrap(), "1.2345e+25");
        assert_eq!(format_decimal(123.456).unwrap(), "123.456");
    }

    #[test]
    fn test_decimal_in_json() {
        assert_eq!(canon(json!({"pi": 3.14159, "half": 0.5})), r#"{"half":0.5,"pi":3.14159}"#);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            CanonicalValue::decimal(f64::NAN),
            Err(CanonicalizationError::NonFiniteNumber)
        );
        assert_eq!(
            CanonicalValue::decimal(f64::INFINITY),
            Err(CanonicalizationError::NonFiniteNumber)
        );
        let raw = CanonicalValue::Array(vec![CanonicalValue::Decimal(f64::NEG_INFINITY)]);
        assert!(raw.encode().is_err());
    }

    #[test]
    fn test_from_serialize_sorts_hash_map() {
        let mut map = HashMap::new();
        for key in ["delta", "alpha", "charlie", "bravo"] {
            map.insert(key, key.len());
        }
        assert_eq!(
            String::from_utf8(canonical_bytes_of(&map).unwrap()).unwrap(),
            r#"{"alpha":5,"bravo":5,"charlie":7,"delta":5}"#
        );
    }

    #[test]
    fn test_non_string_keys_unsupported() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8, 2], "value");
        let result = canonical_bytes_of(&map);
        assert!(matches!(result, Err(CanonicalizationError::Unsupported(_))));
    }

    #[derive(Serialize)]
    struct Reading {
        sensor: &'static str,
        value: f64,
    }

    #[test]
    fn test_serialize_non_finite_rejected() {
        assert_eq!(
            canonical_bytes_of(&f64::NAN),
            Err(CanonicalizationError::NonFiniteNumber)
        );
        assert_eq!(
            canonical_bytes_of(&vec![1.0, f64::INFINITY]),
            Err(CanonicalizationError::NonFiniteNumber)
        );
        assert_eq!(
            canonical_bytes_of(&Reading {
                sensor: "t1",
                value: f64::NEG_INFINITY,
            }),
            Err(CanonicalizationError::NonFiniteNumber)
        );
        assert_eq!(
            canonical_bytes_of(&Some(f32::NAN)),
            Err(CanonicalizationError::NonFiniteNumber)
        );
    }

    #[test]
    fn test_serialize_nan_differs_from_null() {
        let null: Option<f64> = None;
        assert_eq!(canonical_bytes_of(&null).unwrap(), b"null");
        assert!(canonical_bytes_of(&Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_serialize_finite_struct() {
        let reading = Reading {
            sensor: "t1",
            value: 21.5,
        };
        assert_eq!(
            String::from_utf8(canonical_bytes_of(&reading).unwrap()).unwrap(),
            r#"{"sensor":"t1","value":21.5}"#
        );
    }

    #[derive(Serialize)]
    enum Event {
        Reset,
        Moved(i32, i32),
        Renamed { from: String, to: String },
        Tagged(Vec<char>),
    }

    #[derive(Serialize)]
    struct Batch {
        events: Vec<Event>,
        note: Option<String>,
        pair: (u8, bool),
        scores: BTreeMap<u32, f32>,
    }

    #[test]
    fn test_serialize_matches_json_data_model() {
        let batch = Batch {
            events: vec![
                Event::Reset,
                Event::Moved(-1, 2),
                Event::Renamed {
                    from: "a".into(),
                    to: "b".into(),
                },
                Event::Tagged(vec!['x', 'é']),
            ],
            note: None,
            pair: (7, true),
            scores: BTreeMap::from([(10, 0.5), (2, 1.25)]),
        };

        let via_json = canonical_bytes(&serde_json::to_value(&batch).unwrap()).unwrap();
        assert_eq!(canonical_bytes_of(&batch).unwrap(), via_json);
        assert_eq!(
            String::from_utf8(via_json).unwrap(),
            concat!(
                r#"{"events":["Reset",{"Moved":[-1,2]},{"Renamed":{"from":"a","to":"b"}},"#,
                r#"{"Tagged":["x","é"]}],"note":null,"pair":[7,true],"#,
                r#""scores":{"10":0.5,"2":1.25}}"#
            )
        );
    }

    #[test]
    fn test_canonical_deterministic() {
        let value = json!({"entity": "registry", "seq": 7, "tags": ["a", "b"]});
        assert_eq!(canonical_bytes(&value).unwrap(), canonical_bytes(&value).unwrap());
    }
}
