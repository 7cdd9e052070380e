/// Counts the agencies that have completed their submission
///
/// only the server loop mutates it, sessions are handled one at a time.
#[derive(Debug)]
pub struct CompletionTracker {
    count: usize,
    expected: usize,
}

impl CompletionTracker {
    pub fn new(expected: usize) -> Self {
        Self { count: 0, expected }
    }

    /// records a successfully completed session
    ///
    /// returns true exactly once: when the expected number of agencies is reached.
    /// completions past that point are ignored.
    pub fn note_completion(&mut self) -> bool {
        if self.count == self.expected {
            tracing::warn!(
                action = "note_completion",
                result = "ignored",
                expected = self.expected,
                "all agencies have already completed their submission"
            );
            return false;
        }

        self.count += 1;
        self.count == self.expected
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
