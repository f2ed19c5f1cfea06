pub mod charts;
pub mod pages;

pub use pages::*;
