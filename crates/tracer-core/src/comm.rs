/// Cooperating-process context: rank identity and reductions.
///
/// The tracer only needs its own rank (particle ownership tags) and a max
/// reduction for timing reports. A message-passing backend implements this
/// trait; [`SerialComm`] is the single-process default.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> i32;

    fn size(&self) -> i32;

    /// Maximum of `value` over all ranks, available on every rank.
    fn max_f64(&self, value: f64) -> f64;

    fn is_io_rank(&self) -> bool {
        self.rank() == 0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> i32 {
        0
    }

    fn size(&self) -> i32 {
        1
    }

    fn max_f64(&self, value: f64) -> f64 {
        value
    }
}
