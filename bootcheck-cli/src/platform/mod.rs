//! 终端相关的输出

pub mod console;

pub use console::{print_json, print_summary, ConsoleOutput};
