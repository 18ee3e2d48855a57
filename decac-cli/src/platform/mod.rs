mod cli;

pub use cli::{print_error, print_warning};
