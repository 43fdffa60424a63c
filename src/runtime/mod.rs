//! Runtime execution for compiled lambda expressions

pub mod builtins;
mod evaluator;
pub mod operators;
mod value;

pub use evaluator::{Captured, Closure, Interpreter};
pub use value::Value;
