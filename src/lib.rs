//! # Lucid - Runtime-Compiled Expressions
//!
//! Turns short user-authored expression strings into directly callable,
//! arity-typed functions at runtime. Hosts use it to let end users configure
//! mapping, filtering and tracing behaviour as text.
//!
//! ## Features
//!
//! - **Function literals** - `(a, b) => a * b`, block bodies, closures
//! - **Templates** - `"Name: {first} {last}"` becomes a function of one record
//! - **Support expressions** - named helpers resolved transitively
//! - **Tracing hook** - `trace(value)` / `trace(value, message)` in every expression
//! - **External modules** - `.lx` source files and prebuilt `.lxm` module images
//!
//! ## Quick Start
//!
//! ```rust
//! use lucid::{CompileOptions, Engine, SupportMap, Value};
//!
//! # fn main() -> lucid::Result<()> {
//! let engine = Engine::default();
//!
//! let double = engine.compile_lambda::<1>("(source) => source * 2", &CompileOptions::default())?;
//! assert_eq!(double.apply(2)?, Value::Int(4));
//!
//! let options = CompileOptions::new().with_support(
//!     SupportMap::new()
//!         .with("multiplyBy2", "i => i * 2")
//!         .with("multiplyBy3", "i => i * 3"),
//! );
//! let chained = engine.compile_lambda::<1>("(source) => multiplyBy3(multiplyBy2(source))", &options)?;
//! assert_eq!(chained.apply(2)?, Value::Int(12));
//! # Ok(())
//! # }
//! ```
//!
//! ### Mapping Expressions
//!
//! [`Engine::compile_map_expression`] accepts anything a user may type into a
//! mapping field and picks the right treatment:
//!
//! ```rust
//! use lucid::{CompileOptions, Engine, Value};
//!
//! # fn main() -> lucid::Result<()> {
//! let engine = Engine::default();
//! let options = CompileOptions::default();
//! let person = Value::record([("first", Value::from("Ada")), ("last", Value::from("Lovelace"))]);
//!
//! let template = engine.compile_map_expression("{first} {last}", "Map", &options)?;
//! assert_eq!(template.apply(person.clone())?, Value::from("Ada Lovelace"));
//!
//! let literal = engine.compile_map_expression("constant", "Map", &options)?;
//! assert_eq!(literal.apply(person)?, Value::from("constant"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Classifier → Resolver → Synthesizer → Compiler → Hook Injector → Binder → Callable<N>
//! ```
//!
//! ### Main Components
//!
//! - [`Engine`] - classification and the public compile operations
//! - [`pipeline`] - support resolution, unit synthesis and hook injection
//! - [`compiler`] - the lambda-language compiler behind [`CompileService`]
//! - [`Callable`] - the bound, thread-safe function of `N` inputs
//! - [`Value`] - the dynamic value crossing the callable boundary
//! - [`ReferenceRegistry`] - native libraries expressions can call

// Allow specific clippy warnings that are intentional
#![allow(clippy::module_inception)]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod binder;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod lambda;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use binder::{bind, Arity, Callable, QualifiedMethod, Signature, SupportedArity, ValueKind};
pub use compiler::{CompileService, InMemoryCompiler, LoadedModule, ModuleImage, Program};
pub use config::EngineConfig;
pub use engine::{Classification, CompileOptions, Engine};
pub use error::{Diagnostic, Error, ErrorSeverity, Result};
pub use lambda::{is_lambda, is_template, parameter_count, reformat};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{parse_expression, parse_unit, Expression, Parser, MAX_NESTING};
pub use pipeline::{Session, SupportMap, TraceHook};
pub use runtime::Value;
pub use tools::{Library, ReferenceRegistry, Tool};
