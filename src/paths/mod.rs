// The path and the shared checks used by the mutations
pub mod mutator;
pub mod path;

/// Operators moving a single vertex of a path
pub mod mutations;
