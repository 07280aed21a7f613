//! HTTP execution: headers, interceptors, and the transport seam.

pub mod headers;
pub mod interceptor;
pub mod transport;

pub use headers::HttpHeaderBuilder;
pub use interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};
pub use transport::{BinaryResponse, HttpTransport, ReqwestTransport, RequestOptions};
