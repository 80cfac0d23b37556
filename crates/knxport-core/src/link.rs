//! Link-layer seam
//!
//! The link-layer state machine lives outside this crate. The driver only
//! needs to initialise it, hand it received bytes in arrival order and ask
//! whether a transmission is still in flight.

/// Receiving side of a KNX link layer
pub trait LinkLayer {
    /// Called once before the poll loop starts
    fn init(&mut self);

    /// Called once per received byte, in arrival order
    fn feed_receiver(&mut self, byte: u8);

    /// True while a transmission is in flight
    fn is_busy(&self) -> bool;
}

impl<L: LinkLayer + ?Sized> LinkLayer for Box<L> {
    fn init(&mut self) {
        (**self).init()
    }

    fn feed_receiver(&mut self, byte: u8) {
        (**self).feed_receiver(byte)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }
}
