use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::model::student::Student;

/// Value of the `role` column on `students`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

/// Which account table an identity lives in. Carried in the token.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdentityKind {
    Student,
    Admin,
}

/// Row of the `admin` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminAccount {
    pub id: u64,
    pub username: String,
    pub password: String,
}

/// Caller identity resolved from a token.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Student(Student),
    Admin(AdminAccount),
}

impl Identity {
    pub fn id(&self) -> u64 {
        match self {
            Identity::Student(s) => s.id,
            Identity::Admin(a) => a.id,
        }
    }

    pub fn kind(&self) -> IdentityKind {
        match self {
            Identity::Student(_) => IdentityKind::Student,
            Identity::Admin(_) => IdentityKind::Admin,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Student(s) => &s.name,
            Identity::Admin(a) => &a.username,
        }
    }

    /// Admin accounts, and students promoted to the admin role.
    pub fn is_admin(&self) -> bool {
        match self {
            Identity::Student(s) => s.role == Role::Admin,
            Identity::Admin(_) => true,
        }
    }

    pub fn student_id(&self) -> Option<u64> {
        match self {
            Identity::Student(s) => Some(s.id),
            Identity::Admin(_) => None,
        }
    }
}
