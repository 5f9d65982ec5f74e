use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, Contact};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub items: Vec<Contact>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub title: String,
    pub address_line: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}
