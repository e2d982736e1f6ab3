//! Cyclic swap paths.

use crate::{PathError, Symbol};

/// One swap within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Name of the pair traded ("X/Y" as registered).
    pub pair: Symbol,
    /// false: consume reserve A, produce B. true: the opposite.
    pub reverse: bool,
    /// Asset consumed.
    pub input: Symbol,
    /// Asset produced.
    pub output: Symbol,
}

impl Hop {
    pub fn new(pair: &str, reverse: bool, input: &str, output: &str) -> Self {
        Self {
            pair: Symbol::new(pair),
            reverse,
            input: Symbol::new(input),
            output: Symbol::new(output),
        }
    }
}

/// Supported loop sizes. Each has its own closed-form optimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopShape {
    Triangle,
    Quad,
}

impl LoopShape {
    pub fn from_hop_count(hops: usize) -> Option<Self> {
        match hops {
            3 => Some(LoopShape::Triangle),
            4 => Some(LoopShape::Quad),
            _ => None,
        }
    }

    pub fn hop_count(self) -> usize {
        match self {
            LoopShape::Triangle => 3,
            LoopShape::Quad => 4,
        }
    }
}

/// An immutable closed loop of 3 or 4 hops anchored at a reference asset.
///
/// The name lists the asset chain ("SOL/USDC/ETH/SOL") and is the path's
/// identity for cooldown purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath {
    name: Symbol,
    reference: Symbol,
    shape: LoopShape,
    hops: Vec<Hop>,
}

impl CyclePath {
    /// Build a path, checking that the hops form a closed loop on `reference`.
    pub fn new(reference: &str, hops: Vec<Hop>) -> Result<Self, PathError> {
        let shape = LoopShape::from_hop_count(hops.len())
            .ok_or(PathError::UnsupportedHopCount(hops.len()))?;

        let first = &hops[0];
        if first.input != reference {
            return Err(PathError::OpenStart {
                reference: reference.to_string(),
                found: first.input.to_string(),
            });
        }
        for (index, window) in hops.windows(2).enumerate() {
            if window[0].output != window[1].input {
                return Err(PathError::Broken {
                    index: index + 1,
                    expected: window[0].output.to_string(),
                    found: window[1].input.to_string(),
                });
            }
        }
        let last = &hops[hops.len() - 1];
        if last.output != reference {
            return Err(PathError::OpenEnd {
                reference: reference.to_string(),
                found: last.output.to_string(),
            });
        }

        let mut name = Symbol::new(reference);
        for hop in &hops {
            name.push('/');
            name.push_str(&hop.output);
        }

        Ok(Self {
            name,
            reference: Symbol::new(reference),
            shape,
            hops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn shape(&self) -> LoopShape {
        self.shape
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Whether any hop trades the named pair.
    pub fn uses_pair(&self, pair: &str) -> bool {
        self.hops.iter().any(|h| h.pair == pair)
    }
}
