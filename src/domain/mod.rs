pub mod errors;
pub mod line_item;
pub mod offering;
pub mod order;
pub mod ports;
pub mod quote;
