pub mod backend_client;
pub mod http_handler;
pub mod middleware;

pub use backend_client::ReqwestBackendClient;
pub use http_handler::{AppState, build_router};
