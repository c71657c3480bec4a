//! Session orchestration: drive, watch, steer, and hand over to the human.

pub mod interactive;
pub mod interrupt;
pub mod prompter;
pub mod session_loop;
pub mod telemetry;
pub mod turn_budget;

pub use interactive::InteractiveCommand;
pub use interrupt::InterruptHandle;
pub use prompter::{PromptInput, Prompter};
pub use session_loop::{Phase, SessionLoop, TailState};
pub use telemetry::init_tracing;
pub use turn_budget::TurnBudget;
