//! SQL operand types and runtime values seen by the math functions.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Declared type of a function operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::Bool => "BOOL",
            SqlType::Int => "INT",
            SqlType::Long => "LONG",
            SqlType::Float => "FLOAT",
            SqlType::Double => "DOUBLE",
            SqlType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// A single runtime value delivered to a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl SqlValue {
    /// Type of the value, or `None` for `NULL`, which inhabits every type.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(_) => Some(SqlType::Bool),
            SqlValue::Int(_) => Some(SqlType::Int),
            SqlValue::Long(_) => Some(SqlType::Long),
            SqlValue::Float(_) => Some(SqlType::Float),
            SqlValue::Double(_) => Some(SqlType::Double),
            SqlValue::String(_) => Some(SqlType::String),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Long(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    SqlValue: From<T>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::from)
    }
}
