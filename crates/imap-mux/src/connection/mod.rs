//! Transport establishment and response framing.

mod framed;
mod stream;

pub use framed::FramedReader;
pub use stream::{connect_tls, create_tls_connector};
