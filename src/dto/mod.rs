pub mod auth;
pub mod cart;
pub mod contacts;
pub mod orders;
pub mod products;
