// src/models/credential.rs
use crate::models::sheet::text_flag;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Estado de autenticação de um funcionário.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub password_hash: String,
    #[serde(
        default,
        serialize_with = "serialize_flag",
        deserialize_with = "deserialize_flag"
    )]
    pub must_change: bool,
}

impl Credential {
    pub fn new(password_hash: String, must_change: bool) -> Self {
        Credential {
            password_hash,
            must_change,
        }
    }
}

// A flag é gravada sempre como 0/1, mas versões antigas do ficheiro
// guardavam booleanos ou strings "0"/"1".
fn serialize_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
        Null(()),
    }

    Ok(match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => b,
        RawFlag::Int(i) => i != 0,
        RawFlag::Float(f) => f != 0.0,
        RawFlag::Text(s) => text_flag(&s),
        RawFlag::Null(()) => false,
    })
}
