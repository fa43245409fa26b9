//! Command implementations.

pub mod depth;
pub mod gate;
pub mod research;

pub use self::depth::execute_depth;
pub use self::gate::execute_gate;
pub use self::research::execute_research;
