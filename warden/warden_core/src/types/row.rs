//! Rows and values exchanged with a query executor.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::types::Bitmap;

/// Parameter type declared when preparing a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// 32 or 64 bit integer
    Int,
    /// Boolean
    Bool,
    /// Text
    Text,
    /// Bitmap
    Bitmap,
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// SQL null
    Null,
    /// Integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Text
    Text(String),
    /// Bitmap
    Bitmap(Bitmap),
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Bitmap> for Value {
    fn from(b: Bitmap) -> Self {
        Self::Bitmap(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Column values, in select-list order.
    pub values: Vec<Value>,
}

impl Row {
    /// Create a row from column values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn column(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or_else(|| {
            StoreError::BadRow(format!(
                "column {} missing from {}-column row",
                index,
                self.len()
            ))
            .into()
        })
    }

    /// Integer column. Null is an error.
    pub fn int(&self, index: usize) -> Result<i64> {
        match self.column(index)? {
            Value::Int(i) => Ok(*i),
            other => Err(StoreError::BadRow(format!(
                "column {} is {:?}, not an integer",
                index, other
            ))
            .into()),
        }
    }

    /// Integer column narrowed to `i32`.
    pub fn int32(&self, index: usize) -> Result<i32> {
        let value = self.int(index)?;
        i32::try_from(value).map_err(|_| {
            StoreError::BadRow(format!(
                "column {} value {} does not fit in 32 bits",
                index, value
            ))
            .into()
        })
    }

    /// Optional integer column.
    pub fn opt_int(&self, index: usize) -> Result<Option<i64>> {
        match self.column(index)? {
            Value::Null => Ok(None),
            _ => self.int(index).map(Some),
        }
    }

    /// Boolean column. Null reads as `false`.
    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.column(index)? {
            Value::Bool(b) => Ok(*b),
            Value::Null => Ok(false),
            other => Err(StoreError::BadRow(format!(
                "column {} is {:?}, not a boolean",
                index, other
            ))
            .into()),
        }
    }

    /// Bitmap column. Null reads as the empty bitmap.
    pub fn bitmap(&self, index: usize) -> Result<Bitmap> {
        match self.column(index)? {
            Value::Bitmap(b) => Ok(b.clone()),
            Value::Null => Ok(Bitmap::new()),
            other => Err(StoreError::BadRow(format!(
                "column {} is {:?}, not a bitmap",
                index, other
            ))
            .into()),
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let row = Row::new(vec![
            Value::Int(3),
            Value::Null,
            Value::Bitmap(Bitmap::from([4])),
            Value::Bool(true),
        ]);

        assert_eq!(row.int(0).unwrap(), 3);
        assert_eq!(row.int32(0).unwrap(), 3);
        assert_eq!(row.opt_int(1).unwrap(), None);
        assert!(row.bitmap(1).unwrap().is_empty());
        assert!(row.bitmap(2).unwrap().contains(4));
        assert!(row.bool(3).unwrap());
        assert!(!row.bool(1).unwrap());
    }

    #[test]
    fn test_bad_rows() {
        let row = Row::new(vec![Value::Text("x".into()), Value::Int(i64::MAX)]);

        assert!(row.int(0).is_err());
        assert!(row.int32(1).is_err());
        assert!(row.bool(5).is_err());
    }
}
