pub mod data_point;
pub mod reading;
pub mod time_window;

pub use data_point::{DataPoint, SensorData};
pub use reading::{Gateway, Reading, SensorReading};
pub use time_window::{MILLISECONDS_PER_HOUR, TimeWindow, now_millis};
