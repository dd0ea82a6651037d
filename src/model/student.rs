use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// A registered student. `password` holds the argon2 hash and never leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: u64,
    pub rfid_uid: String,
    pub nis: String,
    pub name: String,
    pub student_class: String,
    pub password: String,
    pub role: Role,
}

/// Public view of a student.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "rfid_uid": "04A1B2C3",
        "nis": "2023001",
        "name": "Ayu Lestari",
        "student_class": "XI IPA 2",
        "role": "student"
    })
)]
pub struct StudentResponse {
    pub id: u64,
    pub rfid_uid: String,
    pub nis: String,
    pub name: String,
    pub student_class: String,
    #[schema(value_type = String, example = "student")]
    pub role: Role,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            rfid_uid: s.rfid_uid,
            nis: s.nis,
            name: s.name,
            student_class: s.student_class,
            role: s.role,
        }
    }
}

/// Student to insert; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub rfid_uid: String,
    pub nis: String,
    pub name: String,
    pub student_class: String,
    pub password: String,
    pub role: Role,
}

/// Administrative update. The badge id is immutable; `password` is a hash and
/// only replaces the stored one when present.
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub nis: String,
    pub name: String,
    pub student_class: String,
    pub role: Role,
    pub password: Option<String>,
}

/// How a request names the student it is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentRef {
    Id(u64),
    Badge(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: Option<String>,
    #[schema(example = "2023001")]
    pub nis: Option<String>,
    #[schema(example = "Ayu Lestari")]
    pub name: Option<String>,
    #[schema(example = "XI IPA 2")]
    pub student_class: Option<String>,
    #[schema(example = "rahasia")]
    pub password: Option<String>,
    #[schema(example = "student", value_type = Option<String>)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStudent {
    #[schema(example = "2023001")]
    pub nis: String,
    #[schema(example = "Ayu Lestari")]
    pub name: String,
    #[schema(example = "XII IPA 2")]
    pub student_class: String,
    #[schema(example = "student", value_type = String)]
    pub role: Role,
    /// Left unchanged when missing or blank
    #[schema(example = "")]
    pub password: Option<String>,
}
