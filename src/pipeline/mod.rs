// Data reconciliation: merge per-source records, then filter and rank

pub mod merge;
pub mod ranking;
