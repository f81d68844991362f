// Transport module: carrier-agnostic engine and pluggable byte-stream carriers
pub mod base;
pub mod config;
pub mod loopback;
pub mod tcp;
pub mod traits;

pub use base::*;
pub use config::*;
pub use loopback::*;
pub use tcp::*;
pub use traits::*;
