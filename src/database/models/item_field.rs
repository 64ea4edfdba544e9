use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::UnknownVariant;

/// Declared type of a collection's custom item field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    String,
    Text,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "Integer",
            FieldType::String => "String",
            FieldType::Text => "Text",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FieldType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Integer" => Ok(FieldType::Integer),
            "String" => Ok(FieldType::String),
            "Text" => Ok(FieldType::Text),
            "Boolean" => Ok(FieldType::Boolean),
            "Date" => Ok(FieldType::Date),
            _ => Err(UnknownVariant::new("field type", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemField {
    pub field_id: i32,
    pub collection_id: i32,
    pub field_name: String,
    #[sqlx(try_from = "String")]
    pub field_type: FieldType,
}

/// Field definition as submitted when a collection is created.
/// Accepts both `fieldName` and the `FieldName` spelling older clients send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewItemField {
    #[serde(rename = "fieldName", alias = "FieldName")]
    pub field_name: String,
    #[serde(rename = "fieldType", alias = "FieldType")]
    pub field_type: FieldType,
}
