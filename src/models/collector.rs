use crate::models::job::PostingRecord;

/// Postings gathered during one run, in the order the source emitted them.
///
/// Append-only: records are never removed or reordered and duplicates are
/// kept. A collector belongs to exactly one run.
#[derive(Debug, Default)]
pub struct Collector {
    records: Vec<PostingRecord>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_data(&mut self, record: PostingRecord) {
        self.records.push(record);
    }

    /// Everything appended so far.
    pub fn snapshot(&self) -> &[PostingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<PostingRecord> {
        self.records
    }
}
