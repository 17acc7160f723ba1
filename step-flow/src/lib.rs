pub mod context;
pub mod error;
pub mod runner;
pub mod step;
pub mod storage;
pub mod wizard;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use runner::{AppliedResult, WizardCommand, WizardRunner};
pub use step::{Step, StepOutcome, StepResult};
pub use storage::{InMemorySessionStorage, PostgresSessionStorage, Session, SessionStorage};
pub use wizard::{RunResult, Wizard, WizardBuilder, WizardStatus};
