//! Terminal output: progress display and tables.

mod progress_bar;
pub mod table;

pub use self::progress_bar::ByteProgressBar;
