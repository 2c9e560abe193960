//! User-facing message catalogue
//!
//! Error and notification texts shared by the services and the HTTP layer.
//! Parameterised messages are built by the helper functions below.

pub const AUTHORIZED: &str = "You don't have authorized to action this request!";
pub const LOGIN_FAIL: &str = "Login fail, please check your username and password!";
pub const TOKEN_INVALID: &str = "This token is not valid!";
pub const TOKEN_MISSING: &str = "Missing bearer token";
pub const DELETE_SUCCESS: &str = "Remove object by id is success!";
pub const INVALID_BIRTHDAY: &str = "Birthday must use the dd/MM/yyyy format";

pub fn not_found(object: &str, id: impl std::fmt::Display) -> String {
    format!("Can not found {} with id = {}", object, id)
}

pub fn user_not_found_by_username(username: &str) -> String {
    format!("Can not found user with username = {}", username)
}

pub fn username_exists(username: &str) -> String {
    format!("This username : {} is exits", username)
}

pub fn name_exists(name: &str) -> String {
    format!("This name : {} is exits", name)
}

pub fn register_failed(cause: impl std::fmt::Display) -> String {
    format!("Register failed : The error is : {}", cause)
}
