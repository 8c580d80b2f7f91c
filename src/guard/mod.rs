pub mod clock;
pub mod slo;
pub mod window;

pub use clock::{saturating_millis, Clock, ManualClock, SystemClock};
pub use slo::{Evaluation, GuardSettings, GuardState, GuardStatus, RecoveryPolicy, SloGuard};
pub use window::LatencyWindow;
