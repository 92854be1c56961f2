//! Resource custodian boundary.
//!
//! How deposits arrive and how outgoing calls reach other systems is the
//! custodian's concern. The vault only calls into it.

pub mod memory;
pub mod traits;

pub use memory::InMemoryCustodian;
pub use traits::{Amount, Custodian, CustodianError, CustodianResult};
