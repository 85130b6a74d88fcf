pub mod credentials;
pub mod navigation;
pub mod provider;
pub mod resource;
pub mod server;
pub mod toast;
