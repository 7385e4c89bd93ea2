use ckpt_types::{NamedShape, Shape};
use serde::Serialize;

/// A single entry of a checkpoint diff.
///
/// The engine emits `Keep`, `Insert`, and `Remove`; classification may then
/// refine a `Keep` into a `Modify`. No other transition exists.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiffStep {
    /// Present in both checkpoints with equal shape and identical values.
    Keep { key: String, shape: Shape },
    /// Present only in the target checkpoint.
    Insert { key: String, shape: Shape },
    /// Present only in the source checkpoint.
    Remove { key: String, shape: Shape },
    /// Present in both with equal shape, but the values differ by `distance`.
    Modify {
        key: String,
        shape: Shape,
        distance: f64,
    },
}

impl DiffStep {
    pub fn keep(entry: &NamedShape) -> Self {
        DiffStep::Keep {
            key: entry.key.clone(),
            shape: entry.shape.clone(),
        }
    }

    pub fn insert(entry: &NamedShape) -> Self {
        DiffStep::Insert {
            key: entry.key.clone(),
            shape: entry.shape.clone(),
        }
    }

    pub fn remove(entry: &NamedShape) -> Self {
        DiffStep::Remove {
            key: entry.key.clone(),
            shape: entry.shape.clone(),
        }
    }

    /// The parameter name this step refers to.
    pub fn key(&self) -> &str {
        match self {
            DiffStep::Keep { key, .. }
            | DiffStep::Insert { key, .. }
            | DiffStep::Remove { key, .. }
            | DiffStep::Modify { key, .. } => key,
        }
    }

    pub fn shape(&self) -> &Shape {
        match self {
            DiffStep::Keep { shape, .. }
            | DiffStep::Insert { shape, .. }
            | DiffStep::Remove { shape, .. }
            | DiffStep::Modify { shape, .. } => shape,
        }
    }

    /// The distance carried by a `Modify`, `None` for every other step.
    pub fn distance(&self) -> Option<f64> {
        match self {
            DiffStep::Modify { distance, .. } => Some(*distance),
            _ => None,
        }
    }

    /// Returns `true` for `Keep`, the only step that is not an edit.
    pub fn is_keep(&self) -> bool {
        matches!(self, DiffStep::Keep { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_every_variant() {
        let e = NamedShape::new("layer.w", [3, 4]);
        let steps = [
            DiffStep::keep(&e),
            DiffStep::insert(&e),
            DiffStep::remove(&e),
            DiffStep::Modify {
                key: "layer.w".into(),
                shape: Shape::from([3, 4]),
                distance: 0.25,
            },
        ];
        for step in &steps {
            assert_eq!(step.key(), "layer.w");
            assert_eq!(step.shape(), &Shape::from([3, 4]));
        }
        assert!(steps[0].is_keep());
        assert!(!steps[3].is_keep());
        assert_eq!(steps[3].distance(), Some(0.25));
        assert_eq!(steps[1].distance(), None);
    }

    #[test]
    fn serializes_with_op_tag() {
        let step = DiffStep::Modify {
            key: "w".into(),
            shape: Shape::from([2]),
            distance: 0.5,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "modify", "key": "w", "shape": [2], "distance": 0.5})
        );
    }
}
