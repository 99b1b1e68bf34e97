//! Shared data model for the swap quoting and order-execution core.
//!
//! Every other crate in the workspace speaks in these types: tokens and
//! their amounts, quotes, frozen swap requests, RFQ limit orders and the
//! order-book wire payloads, user notifications and conversion-funnel
//! records.

pub mod account;
pub mod codec;
pub mod common;
pub mod conversion;
pub mod notification;
pub mod quote;
pub mod rfq;
pub mod swap;
pub mod token;
pub mod validation;

pub use account::*;
pub use common::*;
pub use conversion::*;
pub use notification::*;
pub use quote::*;
pub use rfq::*;
pub use swap::*;
pub use token::*;
pub use validation::*;

pub use alloy::primitives::{Address, Bytes, Signature, B256, U256};
pub use rust_decimal::{Decimal, RoundingStrategy};
