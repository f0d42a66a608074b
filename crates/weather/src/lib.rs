mod clock;
mod lightning;
mod orchestrator;
mod rain;
mod tornado;

pub use clock::*;
pub use lightning::*;
pub use orchestrator::*;
pub use rain::*;
pub use tornado::*;
