//! Core types for TextServe

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A class label produced by a fitted classifier.
///
/// Human-readable formats (JSON) see a bare number or string, so a label list
/// serializes as `[1]` or `["spam"]`. Binary formats keep an explicit variant
/// tag, since they cannot tell the two apart on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// Integer class id
    Int(i64),
    /// Named class
    Text(String),
}

impl Label {
    /// Create a text label
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Serialize, Deserialize)]
enum TaggedLabel {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BareLabel {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Integral floats such as `1.0` are integer class ids written by tools that
/// store every class as a float; anything else is rejected.
fn integral_label<E: serde::de::Error>(value: f64) -> Result<Label, E> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(Label::Int(value as i64))
    } else {
        Err(E::custom(format!(
            "class label {value} is not an integer or a string"
        )))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            match self {
                Self::Int(v) => serializer.serialize_i64(*v),
                Self::Text(v) => serializer.serialize_str(v),
            }
        } else {
            let tagged = match self {
                Self::Int(v) => TaggedLabel::Int(*v),
                Self::Text(v) => TaggedLabel::Text(v.clone()),
            };
            tagged.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            Ok(match BareLabel::deserialize(deserializer)? {
                BareLabel::Int(v) => Self::Int(v),
                BareLabel::Float(v) => integral_label(v)?,
                BareLabel::Text(v) => Self::Text(v),
            })
        } else {
            Ok(match TaggedLabel::deserialize(deserializer)? {
                TaggedLabel::Int(v) => Self::Int(v),
                TaggedLabel::Text(v) => Self::Text(v),
            })
        }
    }
}
