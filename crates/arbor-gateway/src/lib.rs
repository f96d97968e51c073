//! HTTP surfaces over the two-stage search: an HTML form view, a static
//! single-page client, and the JSON API it calls.

mod error;
mod handlers;
mod html;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
