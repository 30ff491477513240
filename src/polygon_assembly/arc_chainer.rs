use super::ring_primitives::{are_all_closed, are_all_connected, remove_duplicates_preserve_order};
use crate::geometry::{Arc, Coordinate};

/// Output of one chaining run.
///
/// `points` holds every loop the run walked, back to back. `unused` counts the
/// arcs that could not be joined once the chain stopped growing; a non-zero
/// value means the chain stalled on an open tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub points: Vec<Coordinate>,
    pub unused: usize,
}

impl Chain {
    pub fn is_stalled(&self) -> bool {
        self.unused > 0
    }
}

/// Joins arcs sharing endpoints into closed point sequences, reversing arcs
/// where the join is tail-to-tail.
///
/// When a loop closes and arcs remain, the next unused arc seeds a new loop
/// appended to the same point list. Splitting those loops apart again is the
/// ring splitter's job.
pub fn chain_arcs(arcs: &[Arc]) -> Chain {
    if arcs.is_empty() {
        return Chain::default();
    }

    // Several closed arcs sharing one start point look connected, but each is
    // its own ring.
    let distinct_rings = arcs.len() > 1 && are_all_closed(arcs);
    if are_all_connected(arcs) && !distinct_rings {
        let flattened: Vec<Coordinate> = arcs
            .iter()
            .flat_map(|arc| arc.coords().iter().copied())
            .collect();
        return Chain {
            points: remove_duplicates_preserve_order(&flattened),
            unused: 0,
        };
    }

    let mut used = vec![false; arcs.len()];
    let mut points: Vec<Coordinate> = Vec::new();

    let mut current = 0;
    used[current] = true;
    points.extend_from_slice(arcs[current].coords());
    let mut loop_start = arcs[current].head();
    let mut tail = arcs[current].tail();

    loop {
        if tail == loop_start {
            // Loop closed; seed the next one with the first leftover arc.
            let Some(next) = used.iter().position(|u| !u) else {
                break;
            };
            current = next;
            used[current] = true;
            points.extend_from_slice(arcs[current].coords());
            loop_start = arcs[current].head();
            tail = arcs[current].tail();
            continue;
        }

        match find_joining_arc(arcs, &used, tail, current) {
            Some((next, reversed)) => {
                used[next] = true;
                current = next;
                if reversed {
                    points.extend(arcs[next].coords().iter().rev().copied());
                    tail = arcs[next].head();
                } else {
                    points.extend_from_slice(arcs[next].coords());
                    tail = arcs[next].tail();
                }
            }
            None => break,
        }
    }

    Chain {
        points,
        unused: used.iter().filter(|u| !**u).count(),
    }
}

/// Linear scan for an unused arc, other than `exclude`, touching `tail`.
/// Returns its index and whether it has to be walked backwards.
fn find_joining_arc(
    arcs: &[Arc],
    used: &[bool],
    tail: Coordinate,
    exclude: usize,
) -> Option<(usize, bool)> {
    arcs.iter()
        .enumerate()
        .filter(|(i, _)| *i != exclude && !used[*i])
        .find_map(|(i, arc)| {
            if arc.head() == tail {
                Some((i, false))
            } else if arc.tail() == tail {
                Some((i, true))
            } else {
                None
            }
        })
}
