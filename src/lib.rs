// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # Footprints
//!
//! Attribute resolution and collector-based object selection.
//!
//! ## Core Concept
//!
//! A **footprint** declares the attributes a class needs: their type,
//! admissible and rejected values, aliases, remapping tables, defaults and
//! access mode. Given a loose description (a map of key/value pairs), a
//! footprint resolves it into a complete, validated attribute table:
//!
//! - values are taken from the description, an alias, the context-wide
//!   defaults table or the declared default
//! - `[key]` placeholders are substituted from other attributes or extras
//! - values are remapped, converted to the declared type and checked
//!   against `values` and `outcast`
//!
//! A **collector** groups the classes registered under one tag. Asked for
//! an object matching a description, it screens every class, ranks the
//! ones that fit by priority level and number of supplied attributes, and
//! builds the best.
//!
//! ## Quick Start
//!
//! ```
//! use footprints::{desc, AttrType, AttributeFragment, ClassBuilder, Context, FootprintFragment, Value};
//!
//! let mut ctx = Context::new();
//! ClassBuilder::new("Foo")
//!     .module("demo")
//!     .footprint(
//!         FootprintFragment::new()
//!             .attr(
//!                 "kind",
//!                 AttributeFragment::new().values(["hip", "hop"]).alias(["stuff"]).remap("foo", "hop"),
//!             )
//!             .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(0..10)),
//!     )
//!     .build(&mut ctx)
//!     .unwrap();
//!
//! let mut d = desc! { "stuff" => "foo", "someint" => "7", "extra" => 1 };
//! ctx.pickup(&mut d).unwrap();
//! let foo = d["garbage"].as_instance().unwrap();
//! assert_eq!(foo.get("kind").unwrap(), Value::from("hop"));
//! assert_eq!(foo.get("someint").unwrap(), Value::Int(7));
//! assert!(!d.contains_key("stuff"));
//! assert!(d.contains_key("extra"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  Context (setup, priorities, collectors, classes)           │
//! │       │                                                     │
//! │       ├──► ClassBuilder::build ──► FootprintClass           │
//! │       │          (merge bases, register in collectors)      │
//! │       │                                                     │
//! │       └──► Collector::pickup(desc)                          │
//! │                  │                                          │
//! │                  ├──► FastTrack::subset ──► candidates      │
//! │                  ├──► couldbe = resolve + checkonly         │
//! │                  ├──► rank by (priority, inputs)            │
//! │                  └──► Instance (observed, weakly tracked)   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Attribute-level mismatches never raise during a search: they go to a
//! [`ReportSink`], and collectors keep a [`FootprintLog`] of their recent
//! searches. Broken definitions (placeholder cycles, unreachable keys)
//! always surface as [`Error`]s.

// Ambient
pub mod config;
pub mod config_validate;
pub mod error;
pub mod util;

// Values and types
pub mod format;
pub mod placeholder;
pub mod types;
pub mod value;

// Footprints
pub mod access;
pub mod footprint;
pub mod priorities;
pub mod reporting;
pub mod schema;

// Classes, instances and searches
pub mod class;
pub mod collector;
pub mod context;
pub mod global;
pub mod instance;
pub mod observers;

// Re-exports
pub use access::{Access, AccessMode};
pub use class::{ClassBuilder, FootprintClass, Method, DEFAULT_COLLECTOR};
pub use collector::{AttrMapEntry, Candidate, Collector, FastTrack};
pub use config::{Defaults, Setup, SetupFile};
pub use context::Context;
pub use error::{Error, Result};
pub use footprint::{
    AttributeFragment, AttributeSpec, DefaultValue, Footprint, FootprintFragment, Rejection, Resolution,
    ResolveCache, ResolveOptions, MAX_PASSES,
};
pub use instance::Instance;
pub use observers::{Observer, ObserverBoard, ObserverSet};
pub use priorities::{PriorityLevel, PrioritySet};
pub use reporting::{FootprintLog, NullReport, OnlyWhy, ReportLevel, ReportSink, ReportStyle, Why};
pub use schema::{ClassDef, DefinitionFile, FootprintDef};
pub use types::{AttrType, CustomType};
pub use value::{Description, Extras, Guess, Member, Pattern, Resolvable, Scope, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
