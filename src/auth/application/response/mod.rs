pub mod auth_response;
