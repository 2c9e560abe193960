//! User model
//!
//! This module defines the User entity, the ordered Role enumeration and the
//! inputs accepted by the user service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Textual birthday format accepted on input and emitted on output (`dd/MM/yyyy`).
pub const BIRTHDAY_FORMAT: &str = "%d/%m/%Y";

/// Parse a birthday in [`BIRTHDAY_FORMAT`].
pub fn parse_birthday(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), BIRTHDAY_FORMAT).ok()
}

fn serialize_birthday<S>(birthday: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match birthday {
        Some(date) => serializer.serialize_some(&date.format(BIRTHDAY_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

/// User entity (an account in the newsroom).
///
/// The role is held as a foreign key; load it through `RoleRepository`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique, immutable after creation)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub avatar: Option<String>,
    #[serde(serialize_with = "serialize_birthday")]
    pub birthday: Option<NaiveDate>,
    /// Foreign key into `roles`
    pub role_id: i64,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: String, password_hash: String, full_name: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            full_name,
            email: None,
            phone: None,
            address: None,
            gender: None,
            avatar: None,
            birthday: None,
            role_id: role.id(),
            created_by: None,
            last_modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Privilege level, totally ordered `User < Admin < SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::SuperAdmin];

    /// Position in the privilege order. Higher outranks lower.
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 1,
            Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    /// Whether this role strictly outranks `other`
    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    /// ADMIN or above
    pub fn is_elevated(self) -> bool {
        self.rank() >= Role::Admin.rank()
    }

    /// Primary key of the seeded `roles` row
    pub fn id(self) -> i64 {
        i64::from(self.rank())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// A row of the `roles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    pub id: i64,
    pub role: Role,
}

/// Input for creating a user (registration or elevated create)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Birthday in `dd/MM/yyyy`
    #[serde(default)]
    pub birthday: Option<String>,
    /// Requested role, honoured only for elevated creators
    #[serde(default)]
    pub role: Option<Role>,
}

/// Input for updating a user's profile.
///
/// Every field overwrites the stored value, including with `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Birthday in `dd/MM/yyyy`
    #[serde(default)]
    pub birthday: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "reporter".to_string(),
            "hash".to_string(),
            "Jane Reporter".to_string(),
            Role::Admin,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "reporter");
        assert_eq!(user.role_id, 2);
        assert!(user.birthday.is_none());
    }

    #[test]
    fn test_role_order() {
        assert!(Role::Admin.outranks(Role::User));
        assert!(Role::SuperAdmin.outranks(Role::Admin));
        assert!(!Role::User.outranks(Role::User));
        assert!(!Role::Admin.outranks(Role::SuperAdmin));
        assert!(Role::Admin.is_elevated());
        assert!(!Role::User.is_elevated());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("USER").unwrap(), Role::User);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("Super_Admin").unwrap(), Role::SuperAdmin);
        assert!(Role::from_str("editor").is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_parse_birthday() {
        assert_eq!(parse_birthday("01/02/1990"), NaiveDate::from_ymd_opt(1990, 2, 1));
        assert!(parse_birthday("1990-02-01").is_none());
        assert!(parse_birthday("31/02/1990").is_none());
        assert!(parse_birthday("").is_none());
    }

    #[test]
    fn test_user_serializes_birthday_and_hides_hash() {
        let mut user = User::new("a".into(), "secret-hash".into(), "A".into(), Role::User);
        user.birthday = NaiveDate::from_ymd_opt(2000, 12, 5);

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["birthday"], "05/12/2000");
        assert!(json.get("password_hash").is_none());
    }

    proptest! {
        #[test]
        fn prop_outranks_matches_rank(a in 0usize..3, b in 0usize..3) {
            let (ra, rb) = (Role::ALL[a], Role::ALL[b]);
            prop_assert_eq!(ra.outranks(rb), a > b);
            prop_assert!(!(ra.outranks(rb) && rb.outranks(ra)));
        }

        #[test]
        fn prop_role_display_roundtrip(idx in 0usize..3) {
            let role = Role::ALL[idx];
            prop_assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
    }
}
