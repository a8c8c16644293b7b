use crate::tag;
use chrono::{DateTime, Utc};
use derive_more::From;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

/// Typed value stored against a numeric tag inside a [`MessageEnvelope`].
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, From)]
pub enum FieldValue {
    Text(SmolStr),
    Decimal(Decimal),
    Int(i64),
    Char(char),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn text<S: Into<SmolStr>>(value: S) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            Self::Int(value) => Some(Decimal::from(*value)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Char(value) => write!(f, "{value}"),
            Self::Timestamp(value) => write!(f, "{value}"),
        }
    }
}

/// Opaque tag-addressed message with distinct header and body sections.
///
/// Field insertion order is preserved in both sections, so envelopes render deterministically in
/// logs and assertion failure messages. The harness never assumes a particular wire encoding.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct MessageEnvelope {
    header: IndexMap<u32, FieldValue>,
    body: IndexMap<u32, FieldValue>,
}

impl MessageEnvelope {
    /// Construct an envelope with the provided `MsgType` header field set.
    pub fn new<S: Into<SmolStr>>(msg_type: S) -> Self {
        let mut envelope = Self::default();
        envelope.set_header(tag::MSG_TYPE, FieldValue::Text(msg_type.into()));
        envelope
    }

    pub fn is_set(&self, tag: u32) -> bool {
        self.body.contains_key(&tag)
    }

    pub fn get(&self, tag: u32) -> Option<&FieldValue> {
        self.body.get(&tag)
    }

    pub fn get_text(&self, tag: u32) -> Option<&str> {
        self.body.get(&tag).and_then(FieldValue::as_text)
    }

    pub fn get_decimal(&self, tag: u32) -> Option<Decimal> {
        self.body.get(&tag).and_then(FieldValue::as_decimal)
    }

    pub fn get_int(&self, tag: u32) -> Option<i64> {
        self.body.get(&tag).and_then(FieldValue::as_int)
    }

    pub fn get_char(&self, tag: u32) -> Option<char> {
        self.body.get(&tag).and_then(FieldValue::as_char)
    }

    pub fn get_timestamp(&self, tag: u32) -> Option<DateTime<Utc>> {
        self.body.get(&tag).and_then(FieldValue::as_timestamp)
    }

    pub fn set(&mut self, tag: u32, value: FieldValue) -> &mut Self {
        self.body.insert(tag, value);
        self
    }

    pub fn set_text<S: Into<SmolStr>>(&mut self, tag: u32, value: S) -> &mut Self {
        self.set(tag, FieldValue::Text(value.into()))
    }

    pub fn set_decimal(&mut self, tag: u32, value: Decimal) -> &mut Self {
        self.set(tag, FieldValue::Decimal(value))
    }

    pub fn set_int(&mut self, tag: u32, value: i64) -> &mut Self {
        self.set(tag, FieldValue::Int(value))
    }

    pub fn set_char(&mut self, tag: u32, value: char) -> &mut Self {
        self.set(tag, FieldValue::Char(value))
    }

    pub fn set_timestamp(&mut self, tag: u32, value: DateTime<Utc>) -> &mut Self {
        self.set(tag, FieldValue::Timestamp(value))
    }

    /// Owning setter for fluent envelope construction.
    pub fn with(mut self, tag: u32, value: FieldValue) -> Self {
        self.body.insert(tag, value);
        self
    }

    pub fn with_text<S: Into<SmolStr>>(self, tag: u32, value: S) -> Self {
        self.with(tag, FieldValue::Text(value.into()))
    }

    pub fn with_decimal(self, tag: u32, value: Decimal) -> Self {
        self.with(tag, FieldValue::Decimal(value))
    }

    pub fn with_int(self, tag: u32, value: i64) -> Self {
        self.with(tag, FieldValue::Int(value))
    }

    pub fn with_char(self, tag: u32, value: char) -> Self {
        self.with(tag, FieldValue::Char(value))
    }

    pub fn with_timestamp(self, tag: u32, value: DateTime<Utc>) -> Self {
        self.with(tag, FieldValue::Timestamp(value))
    }

    /// Iterate body fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.body.iter().map(|(tag, value)| (*tag, value))
    }

    pub fn header(&self, tag: u32) -> Option<&FieldValue> {
        self.header.get(&tag)
    }

    pub fn header_text(&self, tag: u32) -> Option<&str> {
        self.header.get(&tag).and_then(FieldValue::as_text)
    }

    pub fn set_header(&mut self, tag: u32, value: FieldValue) -> &mut Self {
        self.header.insert(tag, value);
        self
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.header_text(tag::MSG_TYPE)
    }

    pub fn sender_comp_id(&self) -> Option<&str> {
        self.header_text(tag::SENDER_COMP_ID)
    }

    pub fn target_comp_id(&self) -> Option<&str> {
        self.header_text(tag::TARGET_COMP_ID)
    }

    pub fn set_sender_comp_id<S: Into<SmolStr>>(&mut self, value: S) -> &mut Self {
        self.set_header(tag::SENDER_COMP_ID, FieldValue::Text(value.into()))
    }

    pub fn set_target_comp_id<S: Into<SmolStr>>(&mut self, value: S) -> &mut Self {
        self.set_header(tag::TARGET_COMP_ID, FieldValue::Text(value.into()))
    }

    pub fn set_sending_time(&mut self, value: DateTime<Utc>) -> &mut Self {
        self.set_header(tag::SENDING_TIME, FieldValue::Timestamp(value))
    }
}

impl Display for MessageEnvelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ ")?;
        for (tag, value) in self.header.iter().chain(self.body.iter()) {
            write!(f, "{tag}={value} ")?;
        }
        write!(f, "}}")
    }
}
