pub mod demand;
pub mod document;
pub mod normalize;
pub mod purchase_order;
pub mod stock;
