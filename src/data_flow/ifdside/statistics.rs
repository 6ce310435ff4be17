use std::fmt;
use std::time::Duration;

/// Counters collected during one solver run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStatistics {
    pub path_edges: usize,
    pub jump_function_updates: usize,
    pub summary_edges: usize,
    /// Call visits that could apply an already computed end summary.
    pub summary_reuses: usize,
    pub incoming_edges: usize,
    pub worklist_iterations: u64,
    pub value_propagations: usize,
    pub callee_rescans: usize,
    /// Distinct (call site, callee) pairs whose callee has no body.
    pub bodiless_callees: usize,
    pub interned_facts: usize,
    pub elapsed: Duration,
}

impl fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path edges:            {}", self.path_edges)?;
        writeln!(f, "jump function updates: {}", self.jump_function_updates)?;
        writeln!(f, "summary edges:         {}", self.summary_edges)?;
        writeln!(f, "summary reuses:        {}", self.summary_reuses)?;
        writeln!(f, "incoming edges:        {}", self.incoming_edges)?;
        writeln!(f, "worklist iterations:   {}", self.worklist_iterations)?;
        writeln!(f, "value propagations:    {}", self.value_propagations)?;
        writeln!(f, "callee rescans:        {}", self.callee_rescans)?;
        writeln!(f, "bodiless callees:      {}", self.bodiless_callees)?;
        writeln!(f, "interned facts:        {}", self.interned_facts)?;
        write!(f, "elapsed:               {:?}", self.elapsed)
    }
}
