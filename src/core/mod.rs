pub mod envelope;
pub mod error;

pub use error::{CanonicalError, GatewayError, normalize};
