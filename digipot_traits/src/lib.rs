pub mod clock;
pub mod input;

pub use clock::{Clock, MonotonicClock, Timestamp};
pub use input::{InputEdge, InputLine, Level};

/// Byte transport to the potentiometer wipers.
///
/// `channel` indexes the configured wiper handles; `bytes[0]` is the
/// command/address selector and `bytes[1]` the step value. Nothing is read back.
pub trait PotBus {
    fn write(
        &mut self,
        channel: usize,
        bytes: [u8; 2],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Fixed-size character display addressed by line.
pub trait LineDisplay {
    fn lines(&self) -> usize;
    fn put_line(
        &mut self,
        line: usize,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Producer of raw input edges.
///
/// `start` hands the source a callback that it invokes once per electrical
/// transition, possibly from several threads. Edges must carry monotonic
/// timestamps and arrive in order per line.
pub trait EdgeSource {
    fn start(
        &mut self,
        on_edge: std::sync::Arc<dyn Fn(InputEdge) + Send + Sync>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
