use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};
use uuid::Uuid;

/// Stores any `Display + FromStr` value in a TEXT column.
///
/// Used for ids (sqlx would otherwise write uuids as BLOBs) and for the
/// string-backed enums of the domain model.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct DText<T>(pub T);

pub type DUuid = DText<Uuid>;

impl<T> DText<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for DText<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> std::ops::Deref for DText<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'r, T> Decode<'r, Sqlite> for DText<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Sqlite>>::decode(value)?;
        Ok(Self(raw.parse::<T>()?))
    }
}

impl<T: Display> Encode<'_, Sqlite> for DText<T> {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.to_string().into()));
        Ok(IsNull::No)
    }
}

impl<T> Type<Sqlite> for DText<T> {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

impl<T: Display> Display for DText<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::prelude::{CourseCode, Visibility};

    fn encoded<T: Display>(value: DText<T>) -> String {
        let mut args = Vec::new();
        let _ = value.encode_by_ref(&mut args).unwrap();
        match &args[0] {
            SqliteArgumentValue::Text(text) => text.to_string(),
            _ => panic!("expected Text variant"),
        }
    }

    #[test]
    fn test_encode_as_text() {
        let id = Uuid::new_v4();
        assert_eq!(encoded(DText(id)), id.to_string());
        assert_eq!(encoded(DText(Visibility::Connections)), "connections");
        assert_eq!(
            encoded(DText(CourseCode::parse("cse220").unwrap())),
            "CSE220"
        );
    }
}
