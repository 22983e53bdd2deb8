//! Document walker.
//!
//! Traverses a JSON object breadth-first with an explicit FIFO queue. Nested
//! objects contribute their keys as longer paths; arrays go to the collection
//! reconciler and every other value goes to the setter. Sibling keys are
//! processed in document order.

use crate::merger::Session;
use crate::{collection, setter, MergeObject, MergeOptions, MergeResult, Path};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Apply every key of `root` from `patch` to `original`.
///
/// `base` is the path of the two roots from the top-level object; it is empty
/// for the top-level call and the collection path for collection elements.
pub(crate) fn walk(
    session: &mut Session<'_>,
    root: &Map<String, Value>,
    patch: &dyn MergeObject,
    original: &mut dyn MergeObject,
    base: &Path,
) -> MergeResult<()> {
    let options = session.options;
    let mut queue = VecDeque::new();
    enqueue_children(&mut queue, options, &Path::root(), root);

    while let Some((path, node)) = queue.pop_front() {
        match node {
            Value::Object(children) => enqueue_children(&mut queue, options, &path, children),
            Value::Array(items) => {
                let full_path = base.join(&path);
                collection::apply_array(
                    session,
                    patch,
                    &mut *original,
                    &path,
                    &full_path,
                    node,
                    items,
                )?;
            }
            _ => {
                let full_path = base.join(&path);
                setter::set(session, patch, &mut *original, &path, &full_path, node)?;
            }
        }
    }
    Ok(())
}

/// Queue the children of an object, skipping the removal marker.
fn enqueue_children<'j>(
    queue: &mut VecDeque<(Path, &'j Value)>,
    options: &MergeOptions,
    prefix: &Path,
    children: &'j Map<String, Value>,
) {
    queue.extend(
        children
            .iter()
            .filter(|(key, _)| !options.is_remove_marker(key))
            .map(|(key, child)| (prefix.child(key.as_str()), child)),
    );
}
