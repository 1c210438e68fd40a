use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, WrongType};
use tokio_util::bytes;

use crate::connection::BoundParam;
use crate::types::SqlValue;

/// Borrow bound values as `tokio_postgres` parameters, in `$N` order.
#[must_use]
pub fn as_refs(params: &[BoundParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| &p.value as &(dyn ToSql + Sync))
        .collect()
}

impl ToSql for SqlValue {
    #[allow(clippy::cast_possible_truncation)]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            // Integers arrive as i64; narrow to the column's width.
            SqlValue::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                _ => (*i).to_sql(ty, out),
            },
            SqlValue::Float(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    (*f).to_sql(ty, out)
                }
            }
            SqlValue::Text(s) => s.to_sql(ty, out),
            SqlValue::Bool(b) => (*b).to_sql(ty, out),
            SqlValue::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql(ty, out),
            },
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Json(jsval) => jsval.to_sql(ty, out),
            SqlValue::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::CHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    /// NULL binds to a column of any type; other values are checked
    /// against [`accepts`](ToSql::accepts) first.
    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if self.is_null() {
            return Ok(IsNull::Yes);
        }
        if !<Self as ToSql>::accepts(ty) {
            return Err(Box::new(WrongType::new::<Self>(ty.clone())));
        }
        self.to_sql(ty, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_integers_to_column_width() {
        let mut out = bytes::BytesMut::new();
        SqlValue::Int(7)
            .to_sql_checked(&Type::INT4, &mut out)
            .expect("fits in int4");
        assert_eq!(out.len(), 4);

        let mut out = bytes::BytesMut::new();
        assert!(SqlValue::Int(i64::MAX).to_sql_checked(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn rejects_unsupported_types() {
        assert!(!<SqlValue as ToSql>::accepts(&Type::POINT));
        let mut out = bytes::BytesMut::new();
        assert!(SqlValue::Int(1).to_sql_checked(&Type::NUMERIC, &mut out).is_err());
    }

    #[test]
    fn timestamps_bind_to_date_columns() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        let mut out = bytes::BytesMut::new();
        let written = SqlValue::Timestamp(day)
            .to_sql_checked(&Type::DATE, &mut out)
            .expect("date column");
        assert!(matches!(written, IsNull::No));
        // days since 2000-01-01 as int4
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn null_binds_to_any_column_type() {
        for ty in [Type::DATE, Type::NUMERIC, Type::UUID, Type::INT4] {
            let mut out = bytes::BytesMut::new();
            let written = SqlValue::Null.to_sql_checked(&ty, &mut out).expect("null");
            assert!(matches!(written, IsNull::Yes));
            assert!(out.is_empty());
        }
    }
}
