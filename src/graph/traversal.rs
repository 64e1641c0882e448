//! Deterministic iterative post-order traversal.
//!
//! Used for per-axis closure computation and again for emission ordering
//! across the merged graph. The traversal is iterative with an explicit
//! stack so deep dependency chains cannot overflow the call stack, and
//! children are visited in lexicographic name order so the sequence and
//! everything emitted downstream is reproducible across runs.

use std::collections::HashMap;

use crate::util::diagnostic::GenerateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not reached yet
    White,
    /// On the current path
    Grey,
    /// Fully visited
    Black,
}

struct Frame {
    name: String,
    children: Vec<String>,
    next: usize,
}

/// Produce a sequence visiting every node exactly once, children before
/// parents. Start nodes are taken in sorted order, so roots and isolated
/// nodes are all covered. Fails with [`GenerateError::Cycle`] when the
/// children relation contains a cycle.
pub fn post_order<I, F>(names: I, children: F) -> Result<Vec<String>, GenerateError>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Vec<String>,
{
    let mut starts: Vec<String> = names.into_iter().collect();
    starts.sort();
    starts.dedup();

    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut result = Vec::with_capacity(starts.len());

    for start in &starts {
        if marks.get(start) == Some(&Mark::Black) {
            continue;
        }

        let mut stack = vec![new_frame(start.clone(), &children)];
        marks.insert(start.clone(), Mark::Grey);

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next].clone();
                frame.next += 1;

                match marks.get(&child).copied().unwrap_or(Mark::White) {
                    Mark::Black => {}
                    Mark::Grey => {
                        return Err(GenerateError::Cycle {
                            chain: cycle_chain(&stack, &child),
                        });
                    }
                    Mark::White => {
                        marks.insert(child.clone(), Mark::Grey);
                        stack.push(new_frame(child, &children));
                    }
                }
            } else {
                let frame = stack.pop().unwrap();
                marks.insert(frame.name.clone(), Mark::Black);
                result.push(frame.name);
            }
        }
    }

    Ok(result)
}

fn new_frame<F>(name: String, children: &F) -> Frame
where
    F: Fn(&str) -> Vec<String>,
{
    let mut child_names = children(&name);
    child_names.sort();
    child_names.dedup();
    Frame {
        name,
        children: child_names,
        next: 0,
    }
}

/// Render the grey path from the first occurrence of `child` back to
/// itself, e.g. `x -> y -> x`.
fn cycle_chain(stack: &[Frame], child: &str) -> String {
    let start = stack
        .iter()
        .position(|frame| frame.name == child)
        .unwrap_or(0);
    let mut chain: Vec<&str> = stack[start..].iter().map(|f| f.name.as_str()).collect();
    chain.push(child);
    chain.join(" -> ")
}
