// ── Filter state ──
//
// The active query shape and its resolution into request parameters.

mod descriptor;
mod state;

pub use descriptor::{Clock, QueryDescriptor, local_today};
pub use state::{
    DAY_PRESETS, DEFAULT_DAYS, DateRange, Dimension, FilterSnapshot, FilterState, WindowMode,
};
