pub mod http;
pub mod reference;
pub mod tls;

pub use http::{build_request, parse_response, HttpResponse};
pub use reference::classify;
pub use tls::{extract_tls_info, handshake, TlsInfo};
