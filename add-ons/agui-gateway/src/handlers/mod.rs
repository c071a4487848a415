pub mod copilotkit;
pub mod runtime;
