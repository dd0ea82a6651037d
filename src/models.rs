use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::IdentityKind;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "2023001")]
    pub nis: String,
    #[schema(example = "rahasia")]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AdminLoginReqDto {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "rahasia")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    /// Which account table `user_id` refers to
    pub kind: IdentityKind,
    pub exp: usize,
    pub jti: String,
}
