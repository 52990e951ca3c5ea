//! Ground binding: class ids to node names.

use super::branch::GROUND;
use crate::grid::{Axis, GridSpec};
use crate::topology::{ClassId, EquivalenceClasses};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Node name per class id.
///
/// Without GROUND devices class `k` is named `k`, so class 0 is the
/// reference. With GROUND devices every grounded class is `0` and the others
/// are numbered from 1 in ascending class order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeNames {
    names: Vec<String>,
}

impl NodeNames {
    pub fn bind(spec: &GridSpec, classes: &EquivalenceClasses) -> Self {
        let grounded: BTreeSet<ClassId> = spec
            .ground_points()
            .filter_map(|at| classes.class_at(at, Axis::Horizontal))
            .collect();

        let names = if grounded.is_empty() {
            (0..classes.count()).map(|k| k.to_string()).collect()
        } else {
            let mut next = 1usize;
            (0..classes.count())
                .map(|k| {
                    if grounded.contains(&ClassId(k)) {
                        GROUND.to_string()
                    } else {
                        let name = next.to_string();
                        next += 1;
                        name
                    }
                })
                .collect()
        };
        Self { names }
    }

    pub fn name(&self, class: ClassId) -> &str {
        self.names.get(class.0).map(String::as_str).unwrap_or(GROUND)
    }

    /// Distinct node names.
    pub fn distinct(&self) -> BTreeSet<&str> {
        self.names.iter().map(String::as_str).collect()
    }
}
