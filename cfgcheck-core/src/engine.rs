//! Defines the `SignatureSink` trait, the seam between parsing and whatever
//! consumes signatures.
//!
//! The parser streams one file and hands every signature it produces to a
//! sink. In learning mode the sink is a `CatalogBuilder` accumulating
//! occurrence counts; in checking mode it is the plain list of a device's
//! signatures that the matcher scans afterwards.
//!
//! License: MIT OR APACHE 2.0

use crate::signature::Signature;

/// Receives the signatures of one file, in file order.
pub trait SignatureSink {
    fn accept(&mut self, signature: Signature);
}

impl SignatureSink for Vec<Signature> {
    fn accept(&mut self, signature: Signature) {
        self.push(signature);
    }
}
