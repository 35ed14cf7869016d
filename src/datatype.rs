// used for decimal numbers
use bigdecimal::BigDecimal;

// used for date and time values
use chrono::{NaiveDate, NaiveDateTime};

// used when parsing a string to a decimal
use std::str::FromStr;
// used to print out readable forms of a value
use std::fmt;
use std::ops;
use std::collections::BTreeMap;

use crate::construct::RepositoryId;

/// One result row: field name to value.
pub type Fields = BTreeMap<String, FieldValue>;

/// A loosely typed field value as produced by a query.
///
/// The derived order puts `Null` before every other value, so absent fields
/// sort lowest under the natural order. Values of different kinds order by
/// kind first.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Id(RepositoryId),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
    pub fn data_type(&self) -> &'static str {
        match self {
            FieldValue::Null => "Null",
            FieldValue::Boolean(_) => "Boolean",
            FieldValue::Integer(_) => "Integer",
            FieldValue::Decimal(_) => "Decimal",
            FieldValue::Text(_) => "Text",
            FieldValue::Date(_) => "Date",
            FieldValue::DateTime(_) => "DateTime",
            FieldValue::Id(_) => "RepositoryId",
        }
    }
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_id(&self) -> Option<RepositoryId> {
        match self {
            FieldValue::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::DateTime(d) => write!(f, "{}", d),
            FieldValue::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}
impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}
impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i64::from(i))
    }
}
impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        FieldValue::Decimal(d)
    }
}
impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}
impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}
impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}
impl From<NaiveDateTime> for FieldValue {
    fn from(d: NaiveDateTime) -> Self {
        FieldValue::DateTime(d)
    }
}
impl From<RepositoryId> for FieldValue {
    fn from(id: RepositoryId) -> Self {
        FieldValue::Id(id)
    }
}
impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

// Special types below
#[derive(Eq, PartialEq, Hash, PartialOrd, Ord, Clone, Debug)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn from_str(s: &str) -> Option<Decimal> {
        match BigDecimal::from_str(s) {
            Ok(decimal) => Some(Decimal(decimal)),
            _ => None,
        }
    }
}
impl From<BigDecimal> for Decimal {
    fn from(decimal: BigDecimal) -> Self {
        Decimal(decimal)
    }
}
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl ops::Deref for Decimal {
    type Target = BigDecimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Builds a [`Fields`] row from `name => value` pairs.
///
/// ```
/// use recordcache::fields;
/// use recordcache::datatype::FieldValue;
/// let row = fields! { "Headword" => "apple", "Sense" => 2 };
/// assert_eq!(row["Sense"], FieldValue::Integer(2));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::datatype::Fields::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::datatype::Fields::new();
        $(
            row.insert(
                ::std::string::String::from($name),
                $crate::datatype::FieldValue::from($value),
            );
        )+
        row
    }};
}
