//! Structural checks and node equivalence over a grid.

pub mod degree;
pub mod resolver;

pub use degree::DegreeValidator;
pub use resolver::{ClassId, EquivalenceClasses, NodeEquivalenceResolver, PointClass};
