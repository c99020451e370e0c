//! Input schema for the tree model.
//!
//! The schema is a fixed, ordered list of named fields shared between the
//! feature deriver and the tree adapter. Both sides compile against the same
//! struct and ordering, so a drift between them is a type error, not a
//! call-time surprise. Bump `TREE_SCHEMA_VERSION` whenever the field list or
//! its order changes, together with retrained artifacts.

pub const TREE_SCHEMA_VERSION: u16 = 1;

pub const TREE_FEATURE_COUNT: usize = 17;

/// Column order the tree artifact was trained with.
pub const TREE_FEATURE_NAMES: [&str; TREE_FEATURE_COUNT] = [
    "current_a",
    "voltage_v",
    "frequency_hz",
    "power_factor",
    "aux_voltage_v",
    "hour",
    "day_of_week",
    "month",
    "quarter",
    "year",
    "day_of_year",
    "load_lag_1h",
    "load_lag_3h",
    "load_lag_24h",
    "load_roll_avg_3h",
    "load_roll_avg_6h",
    "load_roll_avg_24h",
];

/// Feature vector for one timestamp, in physical units.
///
/// Lag and rolling fields are `None` when the window holds too little prior
/// history; they flatten to NaN so the tree model's native missing-value
/// branching handles them. They are never imputed here.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeFeatures {
    pub current_a: f64,
    pub voltage_v: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    pub aux_voltage_v: f64,
    pub hour: u32,
    pub day_of_week: u32,
    pub month: u32,
    pub quarter: u32,
    pub year: i32,
    pub day_of_year: u32,
    pub load_lag_1h: Option<f64>,
    pub load_lag_3h: Option<f64>,
    pub load_lag_24h: Option<f64>,
    pub load_roll_avg_3h: Option<f64>,
    pub load_roll_avg_6h: Option<f64>,
    pub load_roll_avg_24h: Option<f64>,
}

impl TreeFeatures {
    /// Flatten into schema order for the model input tensor.
    pub fn to_vector(&self) -> [f64; TREE_FEATURE_COUNT] {
        [
            self.current_a,
            self.voltage_v,
            self.frequency_hz,
            self.power_factor,
            self.aux_voltage_v,
            f64::from(self.hour),
            f64::from(self.day_of_week),
            f64::from(self.month),
            f64::from(self.quarter),
            f64::from(self.year),
            f64::from(self.day_of_year),
            missing_as_nan(self.load_lag_1h),
            missing_as_nan(self.load_lag_3h),
            missing_as_nan(self.load_lag_24h),
            missing_as_nan(self.load_roll_avg_3h),
            missing_as_nan(self.load_roll_avg_6h),
            missing_as_nan(self.load_roll_avg_24h),
        ]
    }
}

fn missing_as_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}
