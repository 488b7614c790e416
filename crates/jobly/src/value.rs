//! Owned scalar values carried by fragments and queries.
//!
//! A [`Value`] is what a partial update or a filter binds to a `$n`
//! placeholder. It adapts to the parameter type Postgres infers for the
//! placeholder, so an `Int` can be sent to an `integer`, `bigint` or
//! `numeric` column without the caller choosing a Rust integer width.

use bytes::BytesMut;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, WrongType, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// A scalar bound as a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(v).to_sql(ty, out)
    } else {
        Err(Box::new(WrongType::new::<i64>(ty.clone())))
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::FLOAT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::try_from(v)?.to_sql(ty, out)
    } else {
        Err(Box::new(WrongType::new::<f64>(ty.clone())))
    }
}

fn decimal_to_sql(v: &Decimal, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::NUMERIC {
        v.to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        v.to_f64()
            .ok_or("decimal out of range for float8")?
            .to_sql(ty, out)
    } else if *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::INT2 {
        if !v.fract().is_zero() {
            return Err(format!("decimal {v} is not an integer").into());
        }
        int_to_sql(v.to_i64().ok_or("decimal out of range for integer")?, ty, out)
    } else {
        Err(Box::new(WrongType::new::<Decimal>(ty.clone())))
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => {
                if !<bool as ToSql>::accepts(ty) {
                    return Err(Box::new(WrongType::new::<bool>(ty.clone())));
                }
                b.to_sql(ty, out)
            }
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::Float(f) => float_to_sql(*f, ty, out),
            Value::Decimal(d) => decimal_to_sql(d, ty, out),
            Value::Text(s) => {
                if !<&str as ToSql>::accepts(ty) {
                    return Err(Box::new(WrongType::new::<String>(ty.clone())));
                }
                s.as_str().to_sql(ty, out)
            }
        }
    }

    // Each variant checks the concrete type itself in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(5), Value::Int(5));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(true)), Value::Bool(true));
    }

    #[test]
    fn int_narrows_to_int4() {
        let mut buf = BytesMut::new();
        let res = Value::Int(20000).to_sql(&Type::INT4, &mut buf);
        assert!(matches!(res, Ok(IsNull::No)));
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn int_out_of_range_for_int4_fails() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn text_rejects_integer_column() {
        let mut buf = BytesMut::new();
        assert!(Value::from("abc").to_sql(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_sql_null() {
        let mut buf = BytesMut::new();
        let res = Value::Null.to_sql(&Type::TEXT, &mut buf);
        assert!(matches!(res, Ok(IsNull::Yes)));
        assert!(buf.is_empty());
    }

    #[test]
    fn decimal_binds_to_numeric() {
        let mut buf = BytesMut::new();
        let res = Value::Decimal(Decimal::new(5, 1)).to_sql(&Type::NUMERIC, &mut buf);
        assert!(matches!(res, Ok(IsNull::No)));
    }
}
