//! Where the driver's records come from.

use crate::storage::Record;

/// Supplies the records loaded for one iteration and the record expected
/// under each lookup key.
pub trait RecordSource {
    /// Records `1..=count`, pulled lazily by `batch_insert`.
    fn records(&self, count: usize) -> Box<dyn Iterator<Item = Record> + '_>;

    /// The record at 1-based position `key` of a `records(count)` load.
    fn record(&self, key: usize) -> Record;
}

/// `name-{i}` / `email-{i}@domain.tld`, every email distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl RecordSource for SyntheticSource {
    fn records(&self, count: usize) -> Box<dyn Iterator<Item = Record> + '_> {
        Box::new((1..=count).map(Record::synthetic))
    }

    fn record(&self, key: usize) -> Record {
        Record::synthetic(key)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn records(&self, count: usize) -> Box<dyn Iterator<Item = Record> + '_> {
        (**self).records(count)
    }

    fn record(&self, key: usize) -> Record {
        (**self).record(key)
    }
}
