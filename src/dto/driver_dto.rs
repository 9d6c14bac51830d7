//! DTOs de Driver

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 5, max = 30))]
    pub license_number: String,

    #[validate(length(min = 2, max = 100))]
    pub full_name: String,

    pub phone: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Request para actualizar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 5, max = 30))]
    pub license_number: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    pub phone: Option<String>,
    pub active: Option<bool>,
}
