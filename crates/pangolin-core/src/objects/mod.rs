// Concrete object bindings.
//
// Each module is one instance of the versioned-container contract.
// The full catalog of PAN-OS object types follows the same pattern;
// these three cover the contract's whole surface (multi-variant
// schemas, member lists, alternative subtrees, raw preservation).

pub mod address;
pub mod address_group;
pub mod tag;

pub use address::{Address, AddressKind};
pub use address_group::AddressGroup;
pub use tag::Tag;
