pub mod chart;
pub mod export;
pub mod metric;
pub mod palette;
pub mod selection;
pub mod selector;
pub mod validate;

pub use metric::{MetricSeries, SeriesKey, SeriesMap};
pub use selection::{Selection, TimeRange};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
