use core::{fmt, marker::PhantomData};

use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::SerializeStruct,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::Mode;

const FIELDS: &[&str] = &["count", "element"];

impl<T> Serialize for Mode<T>
where
    T: Serialize,
{
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Mode", 2)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("element", &self.element)?;
        state.end()
    }
}

enum Field {
    Count,
    Element,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = Field;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("`count` or `element`")
            }

            fn visit_str<E>(self, value: &str) -> Result<Field, E>
            where
                E: de::Error,
            {
                match value {
                    "count" => Ok(Field::Count),
                    "element" => Ok(Field::Element),
                    _ => Err(de::Error::unknown_field(value, FIELDS)),
                }
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

impl<'de, T> Deserialize<'de> for Mode<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ModeVisitor<T> {
            marker: PhantomData<Mode<T>>,
        }

        impl<'de, T> Visitor<'de> for ModeVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = Mode<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mode")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let count = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let element = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(Mode { count, element })
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut count = None;
                let mut element = None;
                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Count => {
                            if count.is_some() {
                                return Err(de::Error::duplicate_field("count"));
                            }
                            count = Some(map.next_value()?);
                        }
                        Field::Element => {
                            if element.is_some() {
                                return Err(de::Error::duplicate_field("element"));
                            }
                            element = Some(map.next_value()?);
                        }
                    }
                }
                let count = count.ok_or_else(|| de::Error::missing_field("count"))?;
                let element = element.ok_or_else(|| de::Error::missing_field("element"))?;
                Ok(Mode { count, element })
            }
        }

        let visitor = ModeVisitor {
            marker: PhantomData,
        };
        deserializer.deserialize_struct("Mode", FIELDS, visitor)
    }
}
