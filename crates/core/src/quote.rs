//! Trade quotes produced by the optimizer.

/// Optimal input and the projected per-hop outputs for one evaluation of a path.
///
/// `outputs[i]` is what hop `i` is expected to produce. Every output except the
/// last has already been reduced by the slippage haircut; the last one is the
/// raw amount returned to the reference asset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TradeQuote {
    pub input: u64,
    pub outputs: Vec<u64>,
}

impl TradeQuote {
    pub fn new(input: u64, outputs: Vec<u64>) -> Self {
        Self { input, outputs }
    }

    /// Amount returned to the reference asset.
    pub fn final_output(&self) -> u64 {
        self.outputs.last().copied().unwrap_or(0)
    }

    /// Final output minus input, in base units of the reference asset. May be negative.
    pub fn margin(&self) -> i128 {
        self.final_output() as i128 - self.input as i128
    }

    pub fn hop_count(&self) -> usize {
        self.outputs.len()
    }
}
