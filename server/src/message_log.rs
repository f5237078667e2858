//! In-memory, append-only chat history
//!
//! Every chat message accepted by the server is recorded here exactly once,
//! as the raw `(sender, text)` pair. Formatted wire lines are derived from
//! entries on demand and never stored.

/// One recorded chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position in the log, strictly increasing in insertion order
    pub sequence: u64,
    pub sender: String,
    pub text: String,
}

/// Append-only store of chat messages for the lifetime of the process
///
/// Entries are never edited or removed. Sequence numbers start at 1 and
/// are handed out in append order, so the backing vector is always sorted
/// by sequence.
#[derive(Debug)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    next_sequence: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Records a message and returns its sequence number
    pub fn append(&mut self, sender: &str, text: &str) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.entries.push(LogEntry {
            sequence,
            sender: sender.to_string(),
            text: text.to_string(),
        });

        sequence
    }

    /// Returns the most recent `limit` entries, oldest first
    ///
    /// Yields fewer entries when the log is shorter than `limit`, and none
    /// when `limit` is zero.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries[start..].to_vec()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.entries.last().map(|entry| entry.sequence)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
