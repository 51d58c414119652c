use ratchet_common::Result;

/// Runs one migration body against the database. No transaction is implied.
pub trait Executor {
    fn execute(&mut self, statement: &str) -> Result<()>;
}

/// Dialect-specific bookkeeping for the stored version.
///
/// Every implementation keeps a single integer in a tracking table and must
/// give the same transitions: `initialize` creates the table seeded with 0
/// when absent and does nothing otherwise, `read_version` fails with
/// `NotInitialized` when the table is absent, and `write_version` overwrites
/// unconditionally. There is no locking; concurrent writers clobber each other.
pub trait Backend: Executor {
    /// Short dialect name used in logs.
    fn dialect(&self) -> &'static str;

    fn initialize(&mut self) -> Result<()>;

    fn is_initialized(&mut self) -> Result<bool>;

    fn read_version(&mut self) -> Result<u32>;

    fn write_version(&mut self, version: u32) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, statement: &str) -> Result<()> {
        (**self).execute(statement)
    }
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn dialect(&self) -> &'static str {
        (**self).dialect()
    }

    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn is_initialized(&mut self) -> Result<bool> {
        (**self).is_initialized()
    }

    fn read_version(&mut self) -> Result<u32> {
        (**self).read_version()
    }

    fn write_version(&mut self, version: u32) -> Result<()> {
        (**self).write_version(version)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, statement: &str) -> Result<()> {
        (**self).execute(statement)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn dialect(&self) -> &'static str {
        (**self).dialect()
    }

    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn is_initialized(&mut self) -> Result<bool> {
        (**self).is_initialized()
    }

    fn read_version(&mut self) -> Result<u32> {
        (**self).read_version()
    }

    fn write_version(&mut self, version: u32) -> Result<()> {
        (**self).write_version(version)
    }
}
