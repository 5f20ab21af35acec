//! Index output

mod writers;

pub use self::writers::{to_pretty_json, write_json, FileWriter, OutputWriter};
