//! # knxport Core Library
//!
//! Serial-line adapter for KNX/EIB TP-UART links.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The frame check octet and connect-request frame layout
//! - A poll-driven serial transport with typed outcomes
//! - A fixed link-layer timer table and the tick source that drives it
//! - A driver loop feeding received bytes into an external link layer
//!
//! ## Example
//!
//! ```rust,ignore
//! use knxport_core::{driver::{Driver, DriverConfig}, protocol::*};
//!
//! let transport = SerialTransport::new(TransportConfig::default());
//! let mut driver = Driver::new(transport, my_link_layer, DriverConfig::default());
//! let report = driver.run_session(1)?;
//! println!("received {} bytes", report.bytes_received);
//! ```

pub mod config;
pub mod driver;
pub mod link;
pub mod protocol;
pub mod timer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::AdapterConfig;
    pub use crate::driver::{Driver, DriverConfig, SessionReport};
    pub use crate::link::LinkLayer;
    pub use crate::protocol::{
        build_connect_request, checksum, Frame, PollingResult, SerialTransport, TransportConfig,
        TransportError,
    };
    pub use crate::timer::{StackType, SystemTick, TimerConfig, TimerTable};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
