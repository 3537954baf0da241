use thiserror::Error;

pub type Result<T> = std::result::Result<T, TracerError>;

/// Precondition violations detected on entry to a tracer operation.
///
/// None of these are recoverable locally: they mean the caller handed in a
/// field, level or configuration that does not match the particle layout.
/// When one is returned nothing has been mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TracerError {
    #[error("level {level} out of range: container has {levels} level(s)")]
    LevelOutOfRange { level: usize, levels: usize },

    #[error("{field} is not defined on the particle tile layout")]
    LayoutMismatch { field: &'static str },

    #[error("{field} has centering {found}, expected {expected}")]
    CenteringMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("{field} has {n_grow} ghost cell(s), at least {required} required")]
    InsufficientGhostCells {
        field: &'static str,
        n_grow: i32,
        required: i32,
    },

    #[error("{field} contains NaN or infinite values")]
    NonFiniteField { field: &'static str },

    #[error("time step must be finite, got {dt}")]
    InvalidTimeStep { dt: f64 },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("interpolation table: {0}")]
    InterpolationTable(String),
}
