use serde::de::{self, Deserialize, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::StrDeserializer;
use serde::forward_to_deserialize_any;
use std::fmt;

use crate::ser::SerdeError;
use crate::value::{Array, Object, Value};

/// A small helper that wraps a [Value] and implements
/// `serde::Deserializer`.
pub struct ValueDeserializer<'de> {
    input: &'de Value,
}

impl<'de> ValueDeserializer<'de> {
    pub fn new(input: &'de Value) -> Self {
        ValueDeserializer { input }
    }
}

/// Deserialize a `T` from a borrowed [Value] tree.
pub fn from_value<'de, T>(value: &'de Value) -> Result<T, SerdeError>
where
    T: Deserialize<'de>,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Parse JSON text and deserialize a `T` from it.
pub fn from_str<T>(source: &str) -> Result<T, SerdeError>
where
    T: DeserializeOwned,
{
    let model = crate::parser::from_str(source).map_err(|e| SerdeError::Custom(e.to_string()))?;
    from_value(&model)
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = SerdeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) => {
                // The model stores every number as a double. Integral
                // values surface as i64 so integer fields deserialize.
                let n = *n;
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
                    visitor.visit_i64(n as i64)
                } else {
                    visitor.visit_f64(n)
                }
            }
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(array) => visitor.visit_seq(ArrayAccess { array, index: 0 }),
            Value::Object(object) => visitor.visit_map(ObjectAccess { object, index: 0 }),
        }
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Number(n) => visitor.visit_f64(*n),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::String(variant) => visitor.visit_enum(EnumRef { variant, value: None }),
            Value::Object(object) if object.len() == 1 => {
                let variant = object.key_at(0).expect("single entry");
                visitor.visit_enum(EnumRef { variant, value: object.value_at(0) })
            }
            other => Err(SerdeError::Custom(format!(
                "expected a string or a single-entry object for an enum, got {}",
                other
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 char str string bytes
        byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct ArrayAccess<'de> {
    array: &'de Array,
    index: usize,
}

impl<'de> SeqAccess<'de> for ArrayAccess<'de> {
    type Error = SerdeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.array.get(self.index) {
            None => Ok(None),
            Some(item) => {
                self.index += 1;
                seed.deserialize(ValueDeserializer::new(item)).map(Some)
            }
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.array.len() - self.index)
    }
}

struct ObjectAccess<'de> {
    object: &'de Object,
    index: usize,
}

impl<'de> MapAccess<'de> for ObjectAccess<'de> {
    type Error = SerdeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.object.key_at(self.index) {
            None => Ok(None),
            Some(key) => {
                let key_deserializer: StrDeserializer<'de, SerdeError> = StrDeserializer::new(key);
                seed.deserialize(key_deserializer).map(Some)
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .object
            .value_at(self.index)
            .ok_or_else(|| SerdeError::Custom("value requested before key".to_string()))?;
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.object.len() - self.index)
    }
}

struct EnumRef<'de> {
    variant: &'de str,
    value: Option<&'de Value>,
}

impl<'de> EnumAccess<'de> for EnumRef<'de> {
    type Error = SerdeError;
    type Variant = VariantRef<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let variant_deserializer: StrDeserializer<'de, SerdeError> = StrDeserializer::new(self.variant);
        let variant = seed.deserialize(variant_deserializer)?;
        Ok((variant, VariantRef { value: self.value }))
    }
}

struct VariantRef<'de> {
    value: Option<&'de Value>,
}

impl<'de> VariantAccess<'de> for VariantRef<'de> {
    type Error = SerdeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None => Ok(()),
            Some(Value::Null) => Ok(()),
            Some(other) => Err(SerdeError::Custom(format!("unexpected payload {} for unit variant", other))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(SerdeError::Custom("expected a payload for newtype variant".to_string())),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => ValueDeserializer::new(value).deserialize_any(visitor),
            None => Err(SerdeError::Custom("expected a payload for tuple variant".to_string())),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => ValueDeserializer::new(value).deserialize_any(visitor),
            None => Err(SerdeError::Custom("expected a payload for struct variant".to_string())),
        }
    }
}

/// Lets a [Value] tree be built by any self-describing serde format.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Number(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Number(v as f64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Number(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::String(v))
            }

            fn visit_unit<E>(self) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut array = Array::new();
                while let Some(item) = seq.next_element::<Value>()? {
                    array.push(item);
                }
                Ok(Value::Array(array))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut object = Object::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    object.insert(key, value);
                }
                Ok(Value::Object(object))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
