pub mod errors;
pub mod model;
mod sensor_csv;

pub use errors::ParserError;
pub use model::SensorFileData;
pub use sensor_csv::{
    parse_sensor_csv, parse_timestamp, timestamp_layout, DEFAULT_TIMESTAMP_LAYOUT,
    TIMESTAMP_FORMATS,
};
