//! Browser-facing side of the authorization flow

pub mod callback_server;

pub use callback_server::CallbackServer;
