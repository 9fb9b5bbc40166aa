pub mod layouts;
pub mod voucher;

pub use layouts::{print_layout, Orientation};
