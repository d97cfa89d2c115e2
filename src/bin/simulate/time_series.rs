// Per-Commitment JSONL Recorder
// One JSON line per completed reward flow for independent analysis

use dopamine_engine::{Commitment, ContributionType};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct CommitmentRecord {
    pub seed: u64,
    pub flow: u64,
    pub at_ms: u64,
    pub rolls: u64,
    pub goal_id: String,
    #[serde(rename = "type")]
    pub contribution_type: ContributionType,
    pub amount: u32,
    pub amount_index: Option<usize>,
    pub saved: bool,
}

impl CommitmentRecord {
    pub fn new(seed: u64, flow: u64, at_ms: u64, rolls: u64, commitment: &Commitment, amount_index: Option<usize>) -> Self {
        Self {
            seed,
            flow,
            at_ms,
            rolls,
            goal_id: commitment.goal.id.clone(),
            contribution_type: commitment.contribution_type,
            amount: commitment.amount,
            amount_index,
            saved: commitment.saved,
        }
    }
}

/// Accumulates commitment records across runs and writes JSONL.
#[derive(Default)]
pub struct OutcomeRecorder {
    records: Vec<CommitmentRecord>,
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: CommitmentRecord) {
        self.records.push(record);
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for record in &self.records {
            let line = serde_json::to_string(record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        file.flush()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
