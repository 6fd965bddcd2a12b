//! Error type shared by the store-backed ports.

use super::define_port_error;

define_port_error! {
    /// Failures raised by store adapters.
    ///
    /// Adapters translate driver errors into these categories so services can
    /// tell infrastructure faults apart from constraint outcomes that carry
    /// meaning for the caller.
    pub enum PersistenceError {
        /// A connection could not be checked out or was lost mid-operation.
        Connection { message: String } => "store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "store query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Duplicate { message: String } => "record already exists: {message}",
        /// A foreign key pointed at a row that does not exist.
        MissingReference { message: String } => "referenced record missing: {message}",
    }
}
