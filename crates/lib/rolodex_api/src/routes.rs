//! Route paths.

pub const GET_API_HEALTHCHECKER: &str = "/api/healthchecker";

pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const GET_AUTH_CONFIRMED_EMAIL: &str = "/auth/confirmed_email/{token}";
pub const POST_AUTH_REQUEST_EMAIL: &str = "/auth/request_email";
pub const POST_AUTH_RESET_PASSWORD_REQUEST: &str = "/auth/reset_password_request";
pub const AUTH_RESET_PASSWORD: &str = "/auth/reset_password/{token}";

pub const GET_USERS_ME: &str = "/users/me";
pub const PATCH_USERS_AVATAR: &str = "/users/avatar";

pub const CONTACTS: &str = "/contacts";
pub const GET_CONTACTS_SEARCH: &str = "/contacts/search";
pub const GET_CONTACTS_BIRTHDAYS: &str = "/contacts/birthdays";
pub const CONTACTS_ID: &str = "/contacts/{id}";
