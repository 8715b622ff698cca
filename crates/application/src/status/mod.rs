mod aggregator;

pub use aggregator::StatusAggregator;
