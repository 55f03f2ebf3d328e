/// The `[left, right)` byte range still known to hold the target's first line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub left: u64,
    pub right: u64,
}

impl SearchWindow {
    pub fn new(size: u64) -> Self {
        Self { left: 0, right: size }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right
    }

    pub fn midpoint(&self) -> u64 {
        self.left + (self.right - self.left) / 2
    }
}

/// What one probe concluded about the target's position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every visible line is earlier; search forward.
    Earlier,
    /// The first visible line is already later; search backward.
    Later,
    /// An earlier line is directly followed by a later one.
    Absent,
    /// A line with the target date starts here.
    Match(u64),
    /// No line start is visible in the window.
    Degenerate,
}

/// One binary search iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub window: SearchWindow,
    pub mid: u64,
    pub chunk_start: u64,
    pub verdict: Verdict,
}

/// One step of the backward walk towards the first matching line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineStep {
    pub chunk_start: u64,
    /// Earliest matching line start confirmed so far
    pub first: u64,
    /// Whether the chunk still started inside the target date
    pub still_matching: bool,
}

/// Receives the locator's progress; the search never depends on it.
pub trait SearchObserver {
    fn on_probe(&mut self, probe: &Probe);

    fn on_refine(&mut self, _step: &RefineStep) {}
}

impl SearchObserver for () {
    fn on_probe(&mut self, _probe: &Probe) {}
}

/// Emits every probe and refinement step as a `tracing` debug event
#[derive(Debug, Default)]
pub struct TraceObserver;

impl SearchObserver for TraceObserver {
    fn on_probe(&mut self, probe: &Probe) {
        tracing::debug!(
            left = probe.window.left,
            right = probe.window.right,
            mid = probe.mid,
            chunk_start = probe.chunk_start,
            verdict = ?probe.verdict,
            "probe"
        );
    }

    fn on_refine(&mut self, step: &RefineStep) {
        tracing::debug!(
            chunk_start = step.chunk_start,
            first = step.first,
            still_matching = step.still_matching,
            "refine"
        );
    }
}
