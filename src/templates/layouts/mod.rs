pub mod print;

pub use print::{print_layout, Orientation};
