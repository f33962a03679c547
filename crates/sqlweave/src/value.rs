//! Owned argument values collected while rendering.
//!
//! Every literal operand in the expression tree ends up as one [`Value`] in the
//! rendered argument list. Values are plain data: they clone cheaply enough for
//! keyset helpers (which bind the same cursor value more than once) and they
//! serialize for logging.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bound query argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, WrongType, to_sql_checked};
    use uuid::Uuid;

    type ToSqlResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

    /// Encode `v` only if `T` accepts the parameter type the server inferred.
    fn encode<T: ToSql>(v: &T, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        if !T::accepts(ty) {
            return Err(Box::new(WrongType::new::<T>(ty.clone())));
        }
        v.to_sql(ty, out)
    }

    impl ToSql for Value {
        fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => encode(v, ty, out),
                // Narrow to the declared column width.
                Value::Int(v) => match *ty {
                    Type::INT2 => encode(&i16::try_from(*v)?, ty, out),
                    Type::INT4 => encode(&i32::try_from(*v)?, ty, out),
                    Type::FLOAT8 => encode(&(*v as f64), ty, out),
                    _ => encode(v, ty, out),
                },
                Value::Float(v) => match *ty {
                    Type::FLOAT4 => encode(&(*v as f32), ty, out),
                    _ => encode(v, ty, out),
                },
                Value::Text(v) => encode(v, ty, out),
                Value::Bytes(v) => encode(v, ty, out),
                // Documents bound to a text parameter go over as JSON text.
                Value::Json(v) if <String as ToSql>::accepts(ty) => {
                    encode(&serde_json::to_string(v)?, ty, out)
                }
                Value::Json(v) => encode(v, ty, out),
                Value::Date(v) => encode(v, ty, out),
                Value::Time(v) => encode(v, ty, out),
                Value::Timestamp(v) => encode(v, ty, out),
                Value::TimestampTz(v) => encode(v, ty, out),
                Value::Uuid(v) => encode(v, ty, out),
            }
        }

        /// Any type at least one variant can encode; the variant actually
        /// bound is checked in `to_sql`.
        fn accepts(ty: &Type) -> bool {
            <bool as ToSql>::accepts(ty)
                || <i16 as ToSql>::accepts(ty)
                || <i32 as ToSql>::accepts(ty)
                || <i64 as ToSql>::accepts(ty)
                || <f32 as ToSql>::accepts(ty)
                || <f64 as ToSql>::accepts(ty)
                || <String as ToSql>::accepts(ty)
                || <Vec<u8> as ToSql>::accepts(ty)
                || <serde_json::Value as ToSql>::accepts(ty)
                || <NaiveDate as ToSql>::accepts(ty)
                || <NaiveTime as ToSql>::accepts(ty)
                || <NaiveDateTime as ToSql>::accepts(ty)
                || <DateTime<Utc> as ToSql>::accepts(ty)
                || <Uuid as ToSql>::accepts(ty)
        }

        to_sql_checked!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widths_collapse_to_int() {
        assert_eq!(Value::from(7i16), Value::Int(7));
        assert_eq!(Value::from(7u32), Value::Int(7));
        assert_eq!(Value::from(-1i64), Value::Int(-1));
    }

    #[test]
    fn option_none_is_null() {
        let v: Value = None::<i32>.into();
        assert!(v.is_null());
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn binding_checks_the_bound_variant() {
        use bytes::BytesMut;
        use tokio_postgres::types::{ToSql, Type};

        let mut buf = BytesMut::new();
        assert!(Value::Int(5).to_sql_checked(&Type::INT4, &mut buf).is_ok());
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        assert!(Value::from("abc").to_sql_checked(&Type::INT4, &mut buf).is_err());
        assert!(Value::Int(70_000).to_sql_checked(&Type::INT2, &mut buf).is_err());
        assert!(Value::Bool(true).to_sql_checked(&Type::TEXT, &mut buf).is_err());
        assert!(Value::Null.to_sql_checked(&Type::UUID, &mut buf).is_ok());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn json_document_binds_as_text() {
        use bytes::BytesMut;
        use tokio_postgres::types::{ToSql, Type};

        let doc = Value::Json(serde_json::json!({"tag": "rust"}));
        let mut buf = BytesMut::new();
        doc.to_sql_checked(&Type::TEXT, &mut buf).unwrap();
        assert_eq!(&buf[..], br#"{"tag":"rust"}"#);

        let mut buf = BytesMut::new();
        assert!(doc.to_sql_checked(&Type::JSONB, &mut buf).is_ok());
    }

    #[test]
    fn serializes_as_tagged_enum() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, r#"{"Int":3}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(3));
    }
}
