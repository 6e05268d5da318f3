//! Command registry and matcher/dispatcher

mod registry;

pub use registry::{
    CommandAction, CommandMatch, CommandRegistry, CommandSpec, DispatchOutcome,
    UnrecognizedHandler,
};
