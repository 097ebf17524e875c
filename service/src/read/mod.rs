//! Read entities definitions.

pub mod product;
pub mod sale;
