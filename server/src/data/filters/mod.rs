//! Query filter system
//!
//! Compiles dashboard filter selections into parameterized SQL for the
//! analytics query service. Fields are checked against an allow-list
//! schema and values are always returned as bound parameters.
//!
//! ## Usage
//!
//! ```
//! use insight_server::data::filters::{compile, FieldSchema, Operator, Predicate, FilterSpec, Schema};
//!
//! let schema = Schema::new(vec![
//!     FieldSchema::string("organization", &[Operator::Equals]),
//!     FieldSchema::string("region", &[Operator::Equals]),
//! ])
//! .unwrap();
//! let spec = FilterSpec::new(vec![
//!     Predicate::equals("organization", "Acme"),
//!     Predicate::equals("region", "all"),
//! ]);
//!
//! let compiled = compile(&spec, &schema).unwrap();
//! assert_eq!(compiled.clause, "organization = ?");
//! assert_eq!(compiled.params.len(), 1);
//! ```

mod compiler;
mod parser;
mod schema;
mod types;

pub use compiler::{CompileError, CompiledFilter, SqlParam, compile};
pub use parser::{FilterParseError, MAX_FILTERS, parse_filters};
pub use schema::{FieldSchema, FieldType, Schema, SchemaError, is_sql_identifier};
pub use types::{ALL_SENTINEL, FilterSpec, FilterValue, Operator, Predicate};
