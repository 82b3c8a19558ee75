//! Capital Adapters
//!
//! Balance sources that implement `CapitalPort`.

mod paper;

pub use paper::PaperWallet;
