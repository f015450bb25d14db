use crate::model::{Build, ComponentClass};

use super::AffectedSet;

/// Classes outside `affected` whose component differs between the previous
/// build and the revision. Empty when the planner honoured every preserve
/// marker.
pub fn preservation_violations(
    previous: &Build,
    revised: &Build,
    affected: &AffectedSet,
) -> Vec<ComponentClass> {
    revised
        .changed_classes(previous)
        .into_iter()
        .filter(|class| !affected.contains(*class))
        .collect()
}
