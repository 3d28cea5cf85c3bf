//! # VK API schema resolution and TypeScript typings generation
//!
//! Reads the VK API JSON schema (`methods.json`, `objects.json`,
//! `responses.json`, `errors.json`) and writes a tree of TypeScript
//! declaration files: one file per object definition, one file per method
//! section, common helpers, error codes and an `index.ts` re-exporting all of it.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p vk-api-typegen --bin vk-typegen -- \
//!     -s ./vk-api-schema \
//!     -o ./typings
//! ```
//!
//! Only part of the API can be generated with `-m`:
//!
//! ```bash
//! vk-typegen -s ./vk-api-schema -o ./typings -m 'users.*,friends.get'
//! ```
//!
//! Settings can also come from a KDL file passed with `-c`:
//!
//! ```kdl
//! methods "users.*" "friends.get"
//! enum-style "enum"
//! api-version "5.131"
//! ignore-response "storage.get" "keysResponse"
//! output "./typings"
//! ```
//!
//! ## Modules
//!
//! - [`corpus`] - Loading the four schema documents into one arena
//! - [`node`] - Schema node model and JSON parsing
//! - [`resolve`] - Reference lookup and `allOf` flattening
//! - [`graph`] - Dependency tracking, import statements and the export manifest
//! - [`codegen`] - Declaration model and TypeScript emission
//! - [`config`] - Generator options and the KDL config file

pub mod cli;
pub mod codegen;
pub mod config;
pub mod corpus;
pub mod error;
pub mod graph;
pub mod node;
pub mod resolve;
