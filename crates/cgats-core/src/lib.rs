//! # cgats-core - CGATS chart parsing and manipulation
//!
//! A parser, in-memory data model, query engine and serializer for the
//! ANSI CGATS.17 family of line-oriented color-measurement formats used
//! by the Argyll CMS toolchain: test charts, measured patch sets and
//! calibration curves.
//!
//! ## Goals
//!
//! - **Faithful**: matches the reference ecosystem's structural rules
//!   and numeric rounding/padding closely enough that round-tripped
//!   files stay consumable by the tools that produced them
//! - **Schema-aware**: `DATA` rows are validated against the governing
//!   `DATA_FORMAT` columns at insert time, not at write time
//! - **Lenient where the ecosystem is**: hand-edited charts with stray
//!   lines or unbalanced sections still parse
//!
//! ## Quick Start
//!
//! ```
//! use cgats_core::{Cgats, Query};
//!
//! let input = "\
//! CTI3
//! DESCRIPTOR \"Output measurement\"
//! BEGIN_DATA_FORMAT
//! RGB_R RGB_G RGB_B XYZ_X XYZ_Y XYZ_Z
//! END_DATA_FORMAT
//! BEGIN_DATA
//! 0 0 0 0.01 0.01 0.02
//! 100 100 100 95.05 100.0 108.9
//! END_DATA
//! ";
//!
//! let doc = Cgats::parse(input)?;
//! let chart = doc.chart(0).unwrap();
//! assert_eq!(doc.number_of_sets(chart), Some(2));
//!
//! // find the white patch and read its luminance
//! let q = Query::pair("RGB_R", 100)
//!     .and("RGB_G", 100)
//!     .and("RGB_B", 100)
//!     .extract("XYZ_Y");
//! let y = doc.query_first_value(doc.root(), &q).unwrap();
//! assert_eq!(y.as_f64(), Some(100.0));
//! # Ok::<(), cgats_core::Error>(())
//! ```

pub mod document;
pub mod error;
pub mod node;
pub mod parser;
pub mod query;
pub mod value;

mod writer;

pub use document::{Cgats, DEFAULT_TYPE, Payload};
pub use error::{Error, Result};
pub use node::{Entry, Key, Node, NodeId, NodeKind};
pub use parser::ParseOptions;
pub use query::Query;
pub use value::Value;

/// Version of cgats-core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
