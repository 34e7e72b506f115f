//! Terminal output for the command line tool

pub mod console;

pub use console::Console;
