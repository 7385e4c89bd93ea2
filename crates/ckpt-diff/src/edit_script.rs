//! Edit-script search: Myers' greedy O(ND) algorithm over parameter lists.
//!
//! The two collections span an edit graph with the source along the x axis
//! and the target along the y axis. A right move removes `a[x]`, a down move
//! inserts `b[y]`, and a diagonal move keeps a `(key, shape)` pair that is
//! structurally equal on both sides. For each edit distance `d` the search
//! records, per diagonal `k = x - y`, the furthest-reaching `x` and the
//! history that got there. The first history to reach the bottom-right
//! corner is a minimal script.
//!
//! # Invariants
//!
//! - Histories are immutable once recorded. Extending one never alters a
//!   history another diagonal already holds.
//! - Among equally short scripts, the one returned is fixed by the move
//!   tie-break in [`edit_script`] and the input order; inputs are never sorted.

use std::collections::HashSet;

use ckpt_types::NamedShape;
use tracing::debug;

use crate::error::{DiffError, DiffResult, Side};
use crate::step::DiffStep;

/// Append-only store of history nodes.
///
/// A history is a handle to its newest node; each node links to its
/// predecessor. Branching from a frontier is a single push, and the shared
/// prefix is never copied or mutated.
#[derive(Default)]
struct HistoryArena {
    nodes: Vec<HistoryNode>,
}

struct HistoryNode {
    step: DiffStep,
    parent: Option<usize>,
}

/// Handle to the newest node of a history; `None` is the empty history.
type History = Option<usize>;

impl HistoryArena {
    fn push(&mut self, parent: History, step: DiffStep) -> History {
        self.nodes.push(HistoryNode { step, parent });
        Some(self.nodes.len() - 1)
    }

    /// Materialize a history in order, oldest step first.
    fn collect(&self, mut head: History) -> Vec<DiffStep> {
        let mut steps = Vec::new();
        while let Some(i) = head {
            let node = &self.nodes[i];
            steps.push(node.step.clone());
            head = node.parent;
        }
        steps.reverse();
        steps
    }
}

/// Furthest point reached on one diagonal, and how it was reached.
#[derive(Clone, Copy)]
struct Frontier {
    x: isize,
    history: History,
}

/// Frontiers for diagonals `-max-1 ..= max+1`.
struct Frontiers {
    max: usize,
    offset: isize,
    slots: Vec<Option<Frontier>>,
}

impl Frontiers {
    fn new(max: usize) -> Self {
        let offset = max as isize + 1;
        Self {
            max,
            offset,
            slots: vec![None; 2 * max + 3],
        }
    }

    fn get(&self, k: isize) -> Option<Frontier> {
        self.slots[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, frontier: Frontier) {
        self.slots[(k + self.offset) as usize] = Some(frontier);
    }
}

/// Compute a minimal Keep/Insert/Remove script transforming `a` into `b`.
///
/// Entries are matched by structural equality: a key whose shape differs
/// between the two sides is reported as a `Remove` of the old shape and an
/// `Insert` of the new one. The result is deterministic for a given pair of
/// orderings.
///
/// # Errors
///
/// - [`DiffError::DuplicateKey`] if either side repeats a key.
/// - [`DiffError::EditScriptExhausted`] if the search passes its
///   `|a| + |b|` distance bound, which indicates a bug.
pub fn edit_script(a: &[NamedShape], b: &[NamedShape]) -> DiffResult<Vec<DiffStep>> {
    ensure_unique(a, Side::Source)?;
    ensure_unique(b, Side::Target)?;

    let a_max = a.len() as isize;
    let b_max = b.len() as isize;
    let max = a.len() + b.len();

    let mut arena = HistoryArena::default();
    let mut frontiers = Frontiers::new(max);
    // Virtual start just above the origin: the first down move lands on
    // (0, 0) without recording a step.
    frontiers.set(1, Frontier { x: 0, history: None });

    for d in 0..=max as isize {
        for k in (-d..=d).step_by(2) {
            // Down on the left edge; otherwise down only when the diagonal
            // below has not been explored as far right as the one above.
            let go_down =
                k == -d || (k != d && x_of(&frontiers, k - 1)? < x_of(&frontiers, k + 1)?);

            let (mut x, mut history) = if go_down {
                let from = frontier_at(&frontiers, k + 1)?;
                (from.x, from.history)
            } else {
                let from = frontier_at(&frontiers, k - 1)?;
                (from.x + 1, from.history)
            };
            let mut y = x - k;

            if go_down && (1..=b_max).contains(&y) {
                history = arena.push(history, DiffStep::insert(&b[(y - 1) as usize]));
            } else if (1..=a_max).contains(&x) {
                history = arena.push(history, DiffStep::remove(&a[(x - 1) as usize]));
            }

            while x < a_max && y >= 0 && y < b_max && a[x as usize] == b[y as usize] {
                history = arena.push(history, DiffStep::keep(&a[x as usize]));
                x += 1;
                y += 1;
            }

            if x >= a_max && y >= b_max {
                let steps = arena.collect(history);
                debug!(
                    source = a.len(),
                    target = b.len(),
                    distance = d,
                    steps = steps.len(),
                    "edit script found"
                );
                return Ok(steps);
            }
            frontiers.set(k, Frontier { x, history });
        }
    }

    Err(DiffError::EditScriptExhausted { bound: max })
}

fn frontier_at(frontiers: &Frontiers, k: isize) -> DiffResult<Frontier> {
    frontiers
        .get(k)
        .ok_or(DiffError::EditScriptExhausted { bound: frontiers.max })
}

fn x_of(frontiers: &Frontiers, k: isize) -> DiffResult<isize> {
    frontier_at(frontiers, k).map(|f| f.x)
}

fn ensure_unique(entries: &[NamedShape], side: Side) -> DiffResult<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.key.as_str()) {
            return Err(DiffError::DuplicateKey {
                side,
                key: entry.key.clone(),
            });
        }
    }
    Ok(())
}
