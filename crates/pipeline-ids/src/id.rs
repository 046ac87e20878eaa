/// Generates opaque, monotonically increasing ids for segments, sentences,
/// paragraphs, and translation jobs within a session.
pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> String;
}

/// Production id generator: random v4 uuids.
pub struct UuidIdGen;

impl Default for UuidIdGen {
    fn default() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic sequential id generator for tests and golden-file snapshots
/// where stable, reproducible ids are required.
pub struct SequentialIdGen {
    next: u64,
    prefix: &'static str,
}

impl SequentialIdGen {
    pub fn new(prefix: &'static str) -> Self {
        Self { next: 0, prefix }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        format!("{}-{id}", self.prefix)
    }
}

/// Mints a fresh [`IdGenerator`] per component at session-construction time,
/// so the orchestrator can wire up several independently-keyed generators
/// (segments, sentences, paragraphs, jobs) from one injected choice of
/// production-vs-deterministic behavior, rather than threading a concrete
/// type through every component's constructor.
pub trait IdGeneratorFactory: Send + Sync {
    fn make(&self, prefix: &'static str) -> Box<dyn IdGenerator>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenFactory;

impl IdGeneratorFactory for UuidIdGenFactory {
    fn make(&self, _prefix: &'static str) -> Box<dyn IdGenerator> {
        Box::new(UuidIdGen)
    }
}

/// Deterministic factory for tests: every generator it mints is a fresh
/// `SequentialIdGen` seeded at zero for the given prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialIdGenFactory;

impl IdGeneratorFactory for SequentialIdGenFactory {
    fn make(&self, prefix: &'static str) -> Box<dyn IdGenerator> {
        Box::new(SequentialIdGen::new(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_ordered_and_unique() {
        let mut gen = SequentialIdGen::new("seg");
        let ids: Vec<_> = (0..5).map(|_| gen.next_id()).collect();
        assert_eq!(ids, vec!["seg-0", "seg-1", "seg-2", "seg-3", "seg-4"]);
    }

    #[test]
    fn uuid_ids_are_unique() {
        let mut gen = UuidIdGen;
        let a = gen.next_id();
        let b = gen.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn sequential_factory_mints_independent_generators_per_prefix() {
        let factory = SequentialIdGenFactory;
        let mut segs = factory.make("seg");
        let mut sents = factory.make("sent");
        assert_eq!(segs.next_id(), "seg-0");
        assert_eq!(sents.next_id(), "sent-0");
        assert_eq!(segs.next_id(), "seg-1");
    }
}
