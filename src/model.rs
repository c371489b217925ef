use crate::error::{ReelError, ReelResult};

/// Number of tracked activities a summary must carry.
pub const EXPECTED_RECORD_COUNT: usize = 9;

/// One tracked activity. Order within [`UserSummary::records`] is significant:
/// it is both the display order and the reveal order in the stats stage.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProgressRecord {
    pub activity: String,
    pub percent: u8, // 0..=100
    pub glyph: String,
}

/// Input contract for a generation run, produced once by the data-fetch
/// collaborator and never mutated while rendering.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct UserSummary {
    pub display_name: String,
    pub records: Vec<ProgressRecord>,
}

impl UserSummary {
    pub fn validate(&self) -> ReelResult<()> {
        if self.display_name.trim().is_empty() {
            return Err(ReelError::validation("display_name must be non-empty"));
        }
        if self.records.len() != EXPECTED_RECORD_COUNT {
            return Err(ReelError::validation(format!(
                "expected exactly {} progress records, got {}",
                EXPECTED_RECORD_COUNT,
                self.records.len()
            )));
        }
        for record in &self.records {
            if record.percent > 100 {
                return Err(ReelError::validation(format!(
                    "record '{}' has percent {} (must be 0..=100)",
                    record.activity, record.percent
                )));
            }
        }
        Ok(())
    }
}
