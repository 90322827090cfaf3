use crate::headers::map::Entry;
use crate::headers::{HeaderName, HeaderValue};

// ===== Iter =====

/// Iterator over header map entries in insertion order.
#[derive(Debug)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Entry>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(entries: &'a [Entry]) -> Self {
        Self { inner: entries.iter() }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HeaderName, &'a HeaderValue);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.name, &entry.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

// ===== GetAll =====

/// Iterator over every value of one header name, in insertion order.
#[derive(Debug)]
pub struct GetAll<'a> {
    entries: &'a [Entry],
    positions: std::slice::Iter<'a, u32>,
}

impl<'a> GetAll<'a> {
    pub(crate) fn new(entries: &'a [Entry], positions: &'a [u32]) -> Self {
        Self { entries, positions: positions.iter() }
    }

    pub(crate) fn empty() -> Self {
        Self::new(&[], &[])
    }
}

impl<'a> Iterator for GetAll<'a> {
    type Item = &'a HeaderValue;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let position = *self.positions.next()?;
        Some(&self.entries[position as usize].value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl ExactSizeIterator for GetAll<'_> {}
