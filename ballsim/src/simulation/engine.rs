//! High-level runtime engine settings
//!
//! Selects how the collision pass walks the bodies when building and running
//! a `Scenario`

use super::kdtree::VisitOrder;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub visit_order: VisitOrder, // order bodies take their turn in the pair query
}
