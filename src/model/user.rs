use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, HardDeletable, Table};

pub const TABLE_USERS: Table = TableDefinition::new("users_v1");
pub const TABLE_USERS_CREATED: Table = TableDefinition::new("users_created_v1");

/// Unique index on the (lower-cased) email address
pub const TABLE_USERS_EMAIL: Table = TableDefinition::new("users_email_v1");

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Customer,
}

fn active() -> bool {
    true
}

/// A dashboard account or customer as stored; `password` holds a bcrypt hash
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "isActive", default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// ISO 3166 alpha-2 code, e.g. "US"
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
    /// Path of the uploaded profile photo
    #[serde(default)]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for User {
    const NAME: &'static str = "User";
    const TABLE: Table = TABLE_USERS;
    const CREATED_INDEX: Table = TABLE_USERS_CREATED;
    const KEY_INDEX: Option<Table> = Some(TABLE_USERS_EMAIL);

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn natural_key(&self) -> Option<&str> {
        Some(&self.email)
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "name")?;
        require(&self.email, "email")?;
        if !self.email.contains('@') {
            return Err("email is not a valid address".to_string());
        }
        if self.email != normalize_email(&self.email) {
            return Err("email must be lower case without surrounding spaces".to_string());
        }
        Ok(())
    }
}

impl HardDeletable for User {}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Request payload for creating a user
///
/// The password arrives in clear text and is hashed before it is stored.
#[derive(Deserialize, Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    #[serde(rename = "isActive", alias = "is_active")]
    pub is_active: Option<bool>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    #[serde(rename = "phoneNumber", alias = "phone_number")]
    pub phone_number: Option<String>,
}

impl CreateUser {
    pub fn into_user(self, id: String, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: normalize_email(&self.email),
            password: password_hash,
            role: self.role.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            city: self.city,
            state: self.state,
            country: self.country,
            occupation: self.occupation,
            phone_number: self.phone_number,
            photo: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user as sent to clients: everything but the password
#[derive(Serialize, Debug)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            city: user.city,
            state: user.state,
            country: user.country,
            occupation: user.occupation,
            phone_number: user.phone_number,
            photo: user.photo,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The part of a user embedded in documents that reference it
#[derive(Serialize, Debug, Clone)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Query parameters for listing users
#[derive(Deserialize, Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        match &self.search {
            Some(search) => {
                let search = search.to_lowercase();
                user.name.to_lowercase().contains(&search) || user.email.contains(&search)
            }
            None => true,
        }
    }
}

/// One bar of the geography histogram
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CountryCount {
    /// ISO 3166 alpha-3 code
    pub id: String,
    pub value: usize,
}

/// Request payload for `POST /geography`
#[derive(Deserialize, Debug)]
pub struct AddCountry {
    pub country: String,
}

/// Request payload for `PUT /geography`
#[derive(Deserialize, Debug)]
pub struct MoveUser {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    pub country: String,
}
