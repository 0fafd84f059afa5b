//! Generic lazy tree traversal
//!
//! Iteration helper over trees expressed as a root collection plus a children
//! accessor. Two pop disciplines are provided: depth-first (LIFO, children
//! pushed in reverse so left-to-right preorder is preserved) and breadth-first
//! (FIFO).
//!
//! Precondition: the input is acyclic. There is no cycle detection; a cyclic
//! graph makes the iterator run forever.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopOrder {
    Lifo,
    Fifo,
}

/// Lazy traversal over all nodes reachable from the seeded roots, each
/// visited exactly once (assuming tree-shaped input).
#[derive(Debug)]
pub struct Traversal<N, F> {
    remaining: VecDeque<N>,
    children_of: F,
    order: PopOrder,
}

impl<N, F> Iterator for Traversal<N, F>
where
    F: FnMut(&N) -> Vec<N>,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = match self.order {
            PopOrder::Lifo => self.remaining.pop_back(),
            PopOrder::Fifo => self.remaining.pop_front(),
        }?;
        let children = (self.children_of)(&node);
        match self.order {
            PopOrder::Lifo => {
                for child in children.into_iter().rev() {
                    self.remaining.push_back(child);
                }
            }
            PopOrder::Fifo => self.remaining.extend(children),
        }
        Some(node)
    }
}

/// Depth-first (preorder, left-to-right) traversal.
pub fn traverse_dfs<N, F>(roots: impl IntoIterator<Item = N>, children_of: F) -> Traversal<N, F>
where
    F: FnMut(&N) -> Vec<N>,
{
    // Roots are reversed so the LIFO pop yields them left-to-right.
    let mut remaining: Vec<N> = roots.into_iter().collect();
    remaining.reverse();
    Traversal {
        remaining: remaining.into(),
        children_of,
        order: PopOrder::Lifo,
    }
}

/// Breadth-first (level order) traversal.
pub fn traverse_bfs<N, F>(roots: impl IntoIterator<Item = N>, children_of: F) -> Traversal<N, F>
where
    F: FnMut(&N) -> Vec<N>,
{
    Traversal {
        remaining: roots.into_iter().collect(),
        children_of,
        order: PopOrder::Fifo,
    }
}
