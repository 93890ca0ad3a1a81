pub mod config;
pub mod connection;
pub mod exception;
pub mod header;
pub mod middleware;
pub mod param;
pub mod request;
pub mod response;
pub mod server;

pub use config::Config;
pub use connection::{Connection, Outcome};
pub use exception::Exception;
pub use header::HeaderMap;
pub use middleware::{Middleware, MiddlewareChain, Next};
pub use request::Request;
pub use response::Response;
pub use server::{Recurse, Server};
