pub mod client;
pub mod comparison;
pub mod signer;
pub mod tracking;
pub mod transport;
