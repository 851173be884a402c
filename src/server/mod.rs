mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use error::ServerError;
pub use state::GatewayState;

use std::net::SocketAddr;
use std::sync::Arc;

/// Response header echoing the generated request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn serve(state: Arc<GatewayState>, addr: SocketAddr) -> Result<(), ServerError> {
    router::serve(state, addr).await
}
