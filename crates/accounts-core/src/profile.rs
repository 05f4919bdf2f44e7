//! User profile data and the request bodies that carry it.
//!
//! Outbound bodies are camelCase (`firstName`); the user object returned by
//! the service is snake_case (`first_name`). Both shapes are part of the
//! service contract.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::validate::Field;

/// Account as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-assigned, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Immutable after creation.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn phone(&self) -> Option<&str> {
        present(self.phone.as_ref())
    }

    pub fn dob(&self) -> Option<&str> {
        present(self.dob.as_ref())
    }

    pub fn address(&self) -> Option<&str> {
        present(self.address.as_ref())
    }
}

/// Editable copy of a profile. `email` is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub dob: String,
    pub address: String,
}

impl ProfileDraft {
    /// Fields that can be changed through the update path.
    pub const EDITABLE: [Field; 5] = [
        Field::FirstName,
        Field::LastName,
        Field::Phone,
        Field::DateOfBirth,
        Field::Address,
    ];

    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Phone => &self.phone,
            Field::DateOfBirth => &self.dob,
            Field::Address => &self.address,
            _ => return None,
        };
        Some(value)
    }

    /// Sets an editable field. Returns `false` for fields outside the
    /// editable set (email, passwords, code).
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Phone => &mut self.phone,
            Field::DateOfBirth => &mut self.dob,
            Field::Address => &mut self.address,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            dob: self.dob.clone(),
            address: self.address.clone(),
        }
    }
}

impl From<&UserProfile> for ProfileDraft {
    fn from(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            dob: profile.dob.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
        }
    }
}

/// Body of `PUT /account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub dob: String,
    pub address: String,
}

/// Profile part of `POST /register`; the verification token is added by the
/// client.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub dob: String,
    pub address: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
