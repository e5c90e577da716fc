//! Toolite helper library
//!
//! Small, independent helpers for dashboard-style front ends: date formatting
//! and arithmetic, decimal truncation, color conversion, screen geometry,
//! password rules, list grouping, an event bus and CSV export.

pub mod color;
pub mod date;
pub mod emitter;
pub mod export;
pub mod geometry;
pub mod grouping;
pub mod number;
pub mod password;

pub use color::hex_to_rgba;
pub use date::{
    date_by_offset, date_diff, date_format, is_time_range, is_time_within_intervals, DateInput,
    IntervalEdge, TimeUnit,
};
pub use emitter::{Emitter, SubscriptionId};
pub use export::{export_csv, export_many, ExportOptions, Sheet};
pub use geometry::{angle_between, circle_position, find_intersection, Placement, Point, StartAngle};
pub use grouping::{group_by, group_by_field};
pub use number::{truncate_decimal, truncate_decimal_str};
pub use password::{check_password, generate_password, PasswordPolicy};
