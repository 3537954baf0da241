//! Floating-point precision for positions, velocities and field data.
//!
//! Everything in the crate is generic over [`Real`], which is sealed and
//! implemented for `f32` and `f64` only. Pick the precision once at the top
//! (the driver does this) and the whole tracer stack is monomorphized for it.

use std::fmt::{Debug, Display};

use bytemuck::Pod;
use num_traits::{Float, FromPrimitive, NumAssign};

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Scalar type of particle and field data (`f32` or `f64`).
pub trait Real:
    private::Sealed
    + Float
    + FromPrimitive
    + NumAssign
    + Pod
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const HALF: Self;

    /// Lossy conversion from a configuration value.
    fn of_f64(v: f64) -> Self;

    /// Exact for every index a mesh can hold.
    fn of_i32(v: i32) -> Self;

    fn as_f64(self) -> f64;

    /// `floor(self)` as a cell index. Saturates on overflow, NaN maps to 0.
    fn floor_index(self) -> i32;
}

macro_rules! impl_real {
    ($t:ty) => {
        impl Real for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const HALF: Self = 0.5;

            #[inline]
            fn of_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn of_i32(v: i32) -> Self {
                v as $t
            }

            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn floor_index(self) -> i32 {
                self.floor() as i32
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);
