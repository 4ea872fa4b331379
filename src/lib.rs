//! An interactive shell for nested bucket stores.
//!
//! The store is shown as a tree of directories: buckets are directories and
//! values are files. A session keeps one transaction open and moves a
//! [`level::Level`] around that tree with `cd`, `ls`, `get`, `put` and
//! `mkdir`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod level;
pub mod path;
pub mod repl;
pub mod session;
pub mod store;
pub mod tokenizer;
