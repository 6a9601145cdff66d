use crate::value::{Array, Object, Value};

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use std::fmt;

/// Serialize any `T: Serialize` into the [Value] model.
pub fn to_value<T>(value: &T) -> Result<Value, SerdeError>
where
    T: Serialize,
{
    value.serialize(ValueSerializer)
}

/// Serialize any `T: Serialize` straight to compact JSON text.
pub fn to_string<T>(value: &T) -> Result<String, SerdeError>
where
    T: Serialize,
{
    let model = to_value(value)?;
    Ok(model.dump())
}

#[derive(Debug)]
pub enum SerdeError {
    Custom(String),
}

impl std::error::Error for SerdeError {}
impl fmt::Display for SerdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerdeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl ser::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

pub struct ValueSerializer;

/// Used for a sequence `[elem, elem, ...]`, a tuple, or the payload of a
/// tuple-like enum variant.
pub struct CompoundSeq {
    elements: Vec<Value>,
    variant: Option<&'static str>,
}

impl CompoundSeq {
    fn end_impl(self) -> Result<Value, SerdeError> {
        let array = Value::Array(self.elements.into_iter().collect::<Array>());
        match self.variant {
            None => Ok(array),
            Some(name) => {
                let mut wrapper = Object::new();
                wrapper.insert(name, array);
                Ok(Value::Object(wrapper))
            }
        }
    }

    fn serialize_element_impl<T>(&mut self, value: &T) -> Result<(), SerdeError>
    where
        T: ?Sized + Serialize,
    {
        self.elements.push(value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl SerializeSeq for CompoundSeq {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_element_impl(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl SerializeTuple for CompoundSeq {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_element_impl(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl SerializeTupleStruct for CompoundSeq {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_element_impl(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl SerializeTupleVariant for CompoundSeq {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_element_impl(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

/// Used for a map `{key: value, ...}`, a struct, or the payload of a
/// struct-like enum variant. Map keys must serialize to strings.
pub struct CompoundMap {
    object: Object,
    pending_key: Option<String>,
    variant: Option<&'static str>,
}

impl CompoundMap {
    fn key_impl<T>(&mut self, key: &T) -> Result<(), SerdeError>
    where
        T: ?Sized + Serialize,
    {
        match key.serialize(ValueSerializer)? {
            Value::String(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            other => Err(SerdeError::Custom(format!("map key must be a string, got {}", other))),
        }
    }

    fn value_impl<T>(&mut self, value: &T) -> Result<(), SerdeError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SerdeError::Custom("map value serialized before key".to_string()))?;
        self.object.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end_impl(self) -> Result<Value, SerdeError> {
        let object = Value::Object(self.object);
        match self.variant {
            None => Ok(object),
            Some(name) => {
                let mut wrapper = Object::new();
                wrapper.insert(name, object);
                Ok(Value::Object(wrapper))
            }
        }
    }
}

impl SerializeMap for CompoundMap {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.key_impl(key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.value_impl(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl SerializeStruct for CompoundMap {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.object.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl SerializeStructVariant for CompoundMap {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.object.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.end_impl()
    }
}

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = SerdeError;

    type SerializeSeq = CompoundSeq;
    type SerializeTuple = CompoundSeq;
    type SerializeTupleStruct = CompoundSeq;
    type SerializeTupleVariant = CompoundSeq;
    type SerializeMap = CompoundMap;
    type SerializeStruct = CompoundMap;
    type SerializeStructVariant = CompoundMap;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        let mut array = Array::new();
        for byte in v {
            array.push(*byte as i64);
        }
        Ok(Value::Array(array))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let mut wrapper = Object::new();
        wrapper.insert(variant, value.serialize(ValueSerializer)?);
        Ok(Value::Object(wrapper))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(CompoundSeq { elements: Vec::with_capacity(len.unwrap_or(0)), variant: None })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Ok(CompoundSeq { elements: Vec::with_capacity(len), variant: None })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Ok(CompoundSeq { elements: Vec::with_capacity(len), variant: None })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(CompoundSeq { elements: Vec::with_capacity(len), variant: Some(variant) })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(CompoundMap { object: Object::new(), pending_key: None, variant: None })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(CompoundMap { object: Object::new(), pending_key: None, variant: None })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(CompoundMap { object: Object::new(), pending_key: None, variant: Some(variant) })
    }
}

/// Lets a [Value] tree feed any serde serializer (`serde_json`, etc.).
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.len()))?;
                for item in array.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    #[test]
    fn test_struct_to_value() {
        let point = Point { x: 1, y: -2, label: Some("origin".to_string()) };
        let model = to_value(&point).unwrap();
        let object = model.as_object().unwrap();
        assert_eq!(object.key_at(0), Some("x"));
        assert_eq!(object.get("x").unwrap().as_f64(), Some(1.0));
        assert_eq!(object.get("y").unwrap().as_f64(), Some(-2.0));
        assert_eq!(object.get("label").unwrap().as_str(), Some("origin"));
    }

    #[test]
    fn test_none_is_null() {
        let point = Point { x: 0, y: 0, label: None };
        let model = to_value(&point).unwrap();
        assert!(model.as_object().unwrap().get("label").unwrap().is_null());
    }

    #[test]
    fn test_to_string_compact() {
        let point = Point { x: 1, y: 2, label: None };
        assert_eq!(to_string(&point).unwrap(), "{\"x\":1,\"y\":2,\"label\":null}");
    }

    #[test]
    fn test_vec_and_tuple() {
        assert_eq!(to_string(&vec![1, 2, 3]).unwrap(), "[1,2,3]");
        assert_eq!(to_string(&("a", 1, true)).unwrap(), "[\"a\",1,true]");
    }

    #[test]
    fn test_enum_variants() {
        #[derive(Serialize)]
        enum Shape {
            Empty,
            Circle(f64),
            Rect { w: f64, h: f64 },
        }
        assert_eq!(to_string(&Shape::Empty).unwrap(), "\"Empty\"");
        assert_eq!(to_string(&Shape::Circle(2.5)).unwrap(), "{\"Circle\":2.5}");
        assert_eq!(to_string(&Shape::Rect { w: 1.0, h: 2.0 }).unwrap(), "{\"Rect\":{\"w\":1,\"h\":2}}");
    }

    #[test]
    fn test_non_string_key_rejected() {
        use std::collections::BTreeMap;
        let map: BTreeMap<i32, i32> = [(1, 2)].into_iter().collect();
        to_value(&map).unwrap_err();
    }

    #[test]
    fn test_value_through_serde_json() {
        let model = crate::parser::from_str("{\"a\":[1,true,null],\"b\":\"x\"}").unwrap();
        let text = serde_json::to_string(&model).unwrap();
        let reparsed = crate::parser::from_str(&text).unwrap();
        assert_eq!(reparsed, model);
    }
}
