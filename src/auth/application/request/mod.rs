pub mod auth_request;
