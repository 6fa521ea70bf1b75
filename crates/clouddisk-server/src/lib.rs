//! clouddisk server bootstrap
//!
//! Loads configuration, selects the datasource, wires the persistence layer
//! and runs the document-to-relational migration when it is due.

pub mod model;
pub mod startup;
