//! Domain definitions.

pub mod eligibility;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod user;

pub use self::{
    eligibility::Eligibility, purchase::Purchase, sale::Item as SaleItem,
    sale::Sale,
};
