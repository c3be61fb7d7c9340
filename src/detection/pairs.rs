//! Candidate pair generation over bucket contents.

use crate::models::TradeRecord;

/// An unordered pair of distinct trades, stored smaller identifier first.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    pub first: &'a TradeRecord,
    pub second: &'a TradeRecord,
}

impl<'a> CandidatePair<'a> {
    /// Canonicalize two trades into a pair. Returns `None` for a self-pair.
    pub fn new(a: &'a TradeRecord, b: &'a TradeRecord) -> Option<Self> {
        if a.id < b.id {
            Some(Self { first: a, second: b })
        } else if b.id < a.id {
            Some(Self { first: b, second: a })
        } else {
            None
        }
    }

    pub fn same_symbol(&self) -> bool {
        self.first.symbol == self.second.symbol
    }

    pub fn same_account(&self) -> bool {
        self.first.same_account(self.second)
    }
}

/// Every unordered pair inside one bucket, each exactly once.
pub fn within<'a, 'b>(
    bucket: &'b [&'a TradeRecord],
) -> impl Iterator<Item = CandidatePair<'a>> + 'b
where
    'a: 'b,
{
    bucket.iter().enumerate().flat_map(move |(i, &a)| {
        bucket[i + 1..]
            .iter()
            .filter_map(move |&b| CandidatePair::new(a, b))
    })
}

/// Every pair with one trade from each of two disjoint buckets.
pub fn across<'a, 'b>(
    left: &'b [&'a TradeRecord],
    right: &'b [&'a TradeRecord],
) -> impl Iterator<Item = CandidatePair<'a>> + 'b
where
    'a: 'b,
{
    left.iter()
        .flat_map(move |&a| right.iter().filter_map(move |&b| CandidatePair::new(a, b)))
}

/// Every pair across a group of disjoint buckets: inside each bucket, then
/// across each later bucket.
pub fn across_group<'a, 'b>(
    group: &'b [&'b [&'a TradeRecord]],
) -> impl Iterator<Item = CandidatePair<'a>> + 'b
where
    'a: 'b,
{
    group.iter().enumerate().flat_map(move |(i, &home)| {
        within(home).chain(
            group[i + 1..]
                .iter()
                .flat_map(move |&other| across(home, other)),
        )
    })
}
