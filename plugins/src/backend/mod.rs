pub mod aiservice;
pub mod http_client;
mod prompt;

pub use aiservice::{AiServiceExecutor, AiServicePlanner};
pub use http_client::{AiHttpError, AiHttpErrorKind, HttpClient};
