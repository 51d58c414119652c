//! Ordered, reversible schema migrations.
//!
//! A [`MigrationList`] numbers its entries by position, [`resolve_target`]
//! validates the requested end state, [`MigrationList::select`] works out the
//! direction and steps, and [`Migrator`] drives them through a [`Backend`],
//! recording the stored version after every statement.

pub mod backend;
pub mod migration;
pub mod migrator;
pub mod plan;
pub mod target;

pub use backend::{Backend, Executor};
pub use migration::{Migration, MigrationList};
pub use migrator::{MigrateError, Migrator, Status};
pub use plan::{Direction, Plan};
pub use target::resolve_target;
