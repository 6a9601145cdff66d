use std::fmt::{Display, Formatter};

use crate::utils::escape_double_quoted;

/// A JSON datum: exactly one of the six JSON variants.
///
/// Containers own their children exclusively; dropping a value drops its
/// whole subtree. A value never changes variant after construction, only
/// container contents do.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
}

impl Value {
    pub fn null() -> Value {
        Value::Null
    }

    pub fn boolean(value: bool) -> Value {
        Value::Bool(value)
    }

    /// Integers are stored as doubles, like every other JSON number.
    pub fn integer(value: i64) -> Value {
        Value::Number(value as f64)
    }

    pub fn number(value: f64) -> Value {
        Value::Number(value)
    }

    pub fn string(value: impl Into<String>) -> Value {
        Value::String(value.into())
    }

    pub fn array() -> Value {
        Value::Array(Array::new())
    }

    pub fn object() -> Value {
        Value::Object(Object::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The numeric value truncated toward zero. `None` for non-numbers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Serialize this value and its entire subtree to compact JSON text.
    ///
    /// No whitespace is emitted. Strings are double-quoted with `"`, `\`
    /// and all control characters escaped. Numbers use the shortest
    /// representation that parses back to the same `f64`; non-finite
    /// numbers (only constructible programmatically) render as `null`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(n) => {
                if n.is_finite() {
                    out.push_str(&n.to_string());
                } else {
                    out.push_str("null");
                }
            }
            Value::String(s) => {
                out.push('"');
                out.push_str(&escape_double_quoted(s));
                out.push('"');
            }
            Value::Array(array) => {
                out.push('[');
                for (idx, item) in array.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    item.write(out);
                }
                out.push(']');
            }
            Value::Object(object) => {
                out.push('{');
                for (idx, (key, value)) in object.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    out.push('"');
                    out.push_str(&escape_double_quoted(key));
                    out.push_str("\":");
                    value.write(out);
                }
                out.push('}');
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dump())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Value {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Value {
        Value::Object(value)
    }
}

/// An ordered JSON array. Insertion order is semantic order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    items: Vec<Value>,
}

impl Array {
    pub fn new() -> Array {
        Array { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indexed access; out of range is `None`, never a panic.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Append a value, returning `&mut self` so pushes can be chained.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Array {
        self.items.push(value.into());
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Array {
        Array { items: iter.into_iter().collect() }
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// An insertion-ordered JSON object.
///
/// Entries are kept as a flat list of pairs rather than a map: order is
/// part of the data model and objects are typically small. `insert`
/// enforces key uniqueness by overwriting in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Object {
        Object { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The key at `index` in insertion order, or `None` out of range.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(key, _)| key.as_str())
    }

    /// The value at `index` in insertion order, or `None` out of range.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, value)| value)
    }

    /// Bind `key` to `value`. An existing key is overwritten in place,
    /// keeping its original position; a new key is appended. Returns
    /// `&mut self` so inserts can be chained.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Object {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// The value bound to `key`, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Object {
        let mut object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_predicates_exclusive() {
        let values = [
            Value::null(),
            Value::boolean(true),
            Value::number(1.5),
            Value::string("x"),
            Value::array(),
            Value::object(),
        ];
        for value in &values {
            let flags = [
                value.is_null(),
                value.is_boolean(),
                value.is_number(),
                value.is_string(),
                value.is_array(),
                value.is_object(),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{:?}", value);
        }
    }

    #[test]
    fn test_checked_accessors() {
        assert_eq!(Value::string("hi").as_str(), Some("hi"));
        assert_eq!(Value::string("hi").as_f64(), None);
        assert_eq!(Value::boolean(true).as_bool(), Some(true));
        assert_eq!(Value::number(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::number(2.9).as_i64(), Some(2));
        assert_eq!(Value::number(-2.9).as_i64(), Some(-2));
        assert_eq!(Value::integer(7).as_f64(), Some(7.0));
        assert!(Value::null().as_array().is_none());
        assert!(Value::array().as_array().is_some());
        assert!(Value::object().as_object().is_some());
        assert!(Value::object().as_array().is_none());
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut object = Object::new();
        object.insert("a", 1).insert("b", 2).insert("a", 3);
        assert_eq!(object.len(), 2);
        assert_eq!(object.key_at(0), Some("a"));
        assert_eq!(object.key_at(1), Some("b"));
        assert_eq!(object.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_out_of_range_is_none() {
        let object = Object::new();
        assert_eq!(object.key_at(0), None);
        assert_eq!(object.value_at(0), None);
        let mut object = Object::new();
        object.insert("a", 1);
        assert_eq!(object.key_at(1), None);
        assert_eq!(object.value_at(usize::MAX), None);

        let mut array = Array::new();
        assert_eq!(array.get(0), None);
        array.push(1).push(2);
        assert_eq!(array.get(2), None);
        assert_eq!(array.get(1), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_dump_empty_containers() {
        assert_eq!(Value::array().dump(), "[]");
        assert_eq!(Value::object().dump(), "{}");
    }

    #[test]
    fn test_dump_compact() {
        let mut object = Object::new();
        let mut items = Array::new();
        items.push(true).push(false).push(Value::null());
        object.insert("a", 1).insert("b", Value::Array(items));
        assert_eq!(Value::Object(object).dump(), "{\"a\":1,\"b\":[true,false,null]}");
    }

    #[test]
    fn test_dump_string_escapes() {
        assert_eq!(Value::string("a\"b").dump(), r#""a\"b""#);
        assert_eq!(Value::string("a\\b").dump(), r#""a\\b""#);
        assert_eq!(Value::string("a\nb\t").dump(), r#""a\nb\t""#);
        assert_eq!(Value::string("\u{1}").dump(), r#""\u0001""#);
        assert_eq!(Value::string("\u{8}\u{c}").dump(), r#""\b\f""#);
        assert_eq!(Value::string("é😀").dump(), "\"é😀\"");
    }

    #[test]
    fn test_dump_numbers() {
        assert_eq!(Value::integer(1).dump(), "1");
        assert_eq!(Value::number(2.5).dump(), "2.5");
        assert_eq!(Value::number(-0.25).dump(), "-0.25");
        assert_eq!(Value::number(f64::NAN).dump(), "null");
        assert_eq!(Value::number(f64::INFINITY).dump(), "null");
    }

    #[test]
    fn test_display_matches_dump() {
        let mut object = Object::new();
        object.insert("k", "v");
        let value = Value::Object(object);
        assert_eq!(value.to_string(), value.dump());
    }
}
