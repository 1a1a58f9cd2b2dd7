pub mod sales;

pub use sales::Entity as Sales;
