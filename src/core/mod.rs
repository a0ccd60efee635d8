// Core modules implementing payload and token decoding plus error modeling.
pub mod error;
pub mod pix;
pub mod tlv;
pub mod token;
