pub mod client;
#[cfg(feature = "native")]
pub mod reqwest_transport;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use client::{ApiClient, SESSION_EXPIRED_CODE, SESSION_HEADER};
#[cfg(feature = "native")]
pub use reqwest_transport::ReqwestTransport;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
