// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # ifc-tape
//!
//! STEP/IFC model loader built around a packed token tape.
//!
//! A STEP file is a flat set of numbered lines (`#N = IFCTYPE(args…);`)
//! referencing each other by integer handles; files reach hundreds of
//! megabytes. Instead of keeping the text around and re-parsing it on every
//! query, the loader tokenizes the whole file once into a compact binary
//! *tape* — a chunked, append-only byte buffer of prefix-typed tokens — and
//! indexes every line by handle and entity type. All reads afterwards are
//! cursor walks over the tape; all writes append fresh tokens and repoint
//! the line's index entry.
//!
//! ## Overview
//!
//! - [`tape::DynamicTape`] — chunked token buffer with a movable read cursor
//! - [`tokenizer::Tokenizer`] — STEP text → tape tokens
//! - [`parser::Parser`] — tape tokens → line index
//! - [`loader::IfcLoader`] — one open model: cursor reads, line writes,
//!   relationship maps, unit scaling, re-serialization
//! - [`api::ModelManager`] — registry mapping model IDs to loaders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_tape::{IfcSchema, LoaderSettings, ModelManager, schema};
//!
//! let mut manager = ModelManager::new();
//! let model = manager.open_model(step_bytes, LoaderSettings::default())?;
//!
//! for express_id in manager.get_line_ids_with_type(model, schema::IFCWALL)? {
//!     let line = manager.get_line(model, express_id)?;
//!     println!("#{} has {} arguments", line.express_id, line.arguments.len());
//! }
//!
//! let step_text = manager.export_file_as_ifc(model)?;
//! manager.close_model(model)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support for settings and raw line data

pub mod api;
pub mod error;
pub mod loader;
pub mod meta_data;
pub mod parser;
pub mod schema;
pub mod serializer;
pub mod tape;
pub mod tokenizer;
pub mod units;

pub use api::ModelManager;
pub use error::{Error, Result};
pub use loader::{IfcLoader, IfcValue, LoaderSettings, RawLineData};
pub use meta_data::{IfcLine, IfcMetaData};
pub use parser::Parser;
pub use schema::IfcSchema;
pub use serializer::dump_as_ifc;
pub use tape::DynamicTape;
pub use tokenizer::{IfcTokenType, Tokenizer};
pub use units::{convert_prefix, read_linear_scaling_factor};
