use std::collections::HashSet;

/// Outcome of offering an id to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting; the record counts toward the limit and must be emitted.
    Accepted,
    /// Already emitted in this session.
    Duplicate,
    /// The limit is already reached, or no session is running.
    Refused,
}

/// Per-session record of emitted ids and the emission cap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
    limit: usize,
    emitted: usize,
}

impl DedupLedger {
    /// `limit == 0` means unlimited.
    pub fn new(limit: usize) -> Self {
        Self {
            seen: HashSet::new(),
            limit,
            emitted: 0,
        }
    }

    pub fn admit(&mut self, id: &str) -> Admission {
        if self.limit_reached() {
            return Admission::Refused;
        }
        if self.seen.contains(id) {
            return Admission::Duplicate;
        }
        self.seen.insert(id.to_owned());
        self.emitted += 1;
        Admission::Accepted
    }

    pub fn limit_reached(&self) -> bool {
        self.limit > 0 && self.emitted >= self.limit
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
