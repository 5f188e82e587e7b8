pub mod csv;
pub mod json;
pub mod paths;

pub use csv::CsvSink;
pub use json::JsonSink;
pub use paths::session_paths;
