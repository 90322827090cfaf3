use bytes::BytesMut;

use crate::headers::iter::{GetAll, Iter};
use crate::headers::{AsHeaderName, HeaderName, HeaderValue, IntoHeaderName};

const fn mask_by_capacity(cap: usize, value: usize) -> usize {
    // capacity is always a power of two, so the subtraction yields a mask
    // equal to `value % capacity`
    value & (cap - 1)
}

/// HTTP Headers Multimap.
///
/// Entries keep their insertion order, duplicate names included; iteration
/// and [`format`] observe that order. An open-addressed index keyed by the
/// lowercased name backs the by-name operations.
///
/// # Header Name
///
/// All operations that require a header name can accept either a static
/// `str` or [`HeaderName`]. When using a static `str` it must be a valid
/// header name in ASCII lowercase. It is prefered to use the
/// [provided constants], which carry a precomputed hash code.
///
/// # Hash Function
///
/// `HeaderMap` **DOES NOT** use a hashing algorithm that provides
/// resistance against HashDoS attacks. It is expected that the user will
/// bound the number of headers well below where such an attack is a
/// concern.
///
/// [`format`]: HeaderMap::format
/// [provided constants]: super::standard
#[derive(Clone, Default)]
pub struct HeaderMap {
    /// insertion-ordered entries, duplicates included
    entries: Vec<Entry>,
    /// open-addressed slots, length zero or a power of two
    slots: Vec<Option<Slot>>,
    /// occupied slot count, one per distinct name
    distinct: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) name: HeaderName,
    pub(crate) value: HeaderValue,
}

#[derive(Clone, Debug)]
struct Slot {
    hash: u32,
    positions: Positions,
}

#[derive(Clone, Debug)]
enum Positions {
    One(u32),
    Many(Vec<u32>),
}

impl Positions {
    fn first(&self) -> u32 {
        match self {
            Self::One(position) => *position,
            Self::Many(positions) => positions[0],
        }
    }

    fn push(&mut self, position: u32) {
        match self {
            Self::One(first) => *self = Self::Many(vec![*first, position]),
            Self::Many(positions) => positions.push(position),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u32] {
        match self {
            Self::One(position) => std::slice::from_ref(position),
            Self::Many(positions) => positions,
        }
    }
}

impl HeaderMap {
    /// Create new empty [`HeaderMap`].
    ///
    /// This function does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: Vec::new(),
            distinct: 0,
        }
    }

    /// Returns the number of entries, duplicate names included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over entries as name and value pairs, in
    /// insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.entries)
    }

    /// Returns `true` if the map contains an entry for the given name.
    pub fn contains_key<K: AsHeaderName>(&self, name: K) -> bool {
        self.find_slot(name.as_str(), name.hash()).is_some()
    }

    /// Returns a reference to the earliest appended value for the given
    /// name.
    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        let index = self.find_slot(name.as_str(), name.hash())?;
        let position = self.slot(index).positions.first();
        Some(&self.entries[position as usize].value)
    }

    /// Returns an iterator over every value for the given name, in
    /// insertion order.
    ///
    /// Note that these are the values of duplicate entries, *NOT* a comma
    /// separated list.
    pub fn get_all<K: AsHeaderName>(&self, name: K) -> GetAll<'_> {
        match self.find_slot(name.as_str(), name.hash()) {
            Some(index) => GetAll::new(&self.entries, self.slot(index).positions.as_slice()),
            None => GetAll::empty(),
        }
    }

    /// Append a header name and value, preserving any existing entries
    /// with the same name.
    ///
    /// # Panics
    ///
    /// When using a static `str` it must be a valid header name, otherwise
    /// this panics.
    pub fn append<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        let name = name.into_header_name();
        let hash = name.hash();

        self.reserve_one();

        let position = self.entries.len() as u32;
        match Self::probe(&self.slots, &self.entries, name.as_str(), hash) {
            Ok(index) => {
                self.entries.push(Entry { name, value });
                self.slot_mut(index).positions.push(position);
            }
            Err(vacant) => {
                self.entries.push(Entry { name, value });
                self.slots[vacant] = Some(Slot {
                    hash,
                    positions: Positions::One(position),
                });
                self.distinct += 1;
            }
        }
    }

    /// Remove every entry for the given name.
    ///
    /// Returns `true` if any entry was removed. The relative order of the
    /// remaining entries is preserved.
    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> bool {
        let Some(index) = self.find_slot(name.as_str(), name.hash()) else {
            return false;
        };
        let Some(slot) = self.slots[index].take() else {
            return false;
        };

        // positions are ascending by construction
        let positions = slot.positions;
        let removed = positions.as_slice();
        let mut cursor = 0;
        let mut position = 0u32;
        self.entries.retain(|_| {
            let hit = cursor < removed.len() && removed[cursor] == position;
            if hit {
                cursor += 1;
            }
            position += 1;
            !hit
        });

        // every surviving position shifted, rebuild the whole index
        self.rebuild_index(self.slots.len());
        true
    }

    /// Stable sort of the entries, lexicographic by lowercased name.
    pub fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        self.rebuild_index(self.slots.len());
    }

    /// Clear the map, removing all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.iter_mut().for_each(|slot| {
            slot.take();
        });
        self.distinct = 0;
    }

    /// Emit every entry as `name: value\r\n`, in insertion order.
    ///
    /// The blank line ending a head block is not emitted here.
    pub fn format(&self, buf: &mut BytesMut) {
        for entry in &self.entries {
            buf.extend_from_slice(entry.name.as_str().as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(entry.value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
    }

    /// Emit every value for `name` as a single comma separated
    /// `name: v1, v2\r\n` line.
    ///
    /// Emits nothing when the map has no entry for `name`.
    pub fn format_comma_separated<K: AsHeaderName>(&self, name: K, buf: &mut BytesMut) {
        let Some(index) = self.find_slot(name.as_str(), name.hash()) else {
            return;
        };

        buf.extend_from_slice(name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        for (i, position) in self.slot(index).positions.as_slice().iter().enumerate() {
            if i > 0 {
                buf.extend_from_slice(b", ");
            }
            buf.extend_from_slice(self.entries[*position as usize].value.as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
    }
}

// ===== Implementation =====

impl HeaderMap {
    fn slot(&self, index: usize) -> &Slot {
        match &self.slots[index] {
            Some(slot) => slot,
            // an index returned by probing always refers to an occupied slot
            None => unreachable!(),
        }
    }

    fn slot_mut(&mut self, index: usize) -> &mut Slot {
        match &mut self.slots[index] {
            Some(slot) => slot,
            None => unreachable!(),
        }
    }

    fn find_slot(&self, name: &str, hash: u32) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        Self::probe(&self.slots, &self.entries, name, hash).ok()
    }

    /// Locate the slot for `name`, or the vacant slot where it belongs.
    ///
    /// The load factor is capped below capacity, so probing always
    /// terminates at a vacant slot.
    fn probe(
        slots: &[Option<Slot>],
        entries: &[Entry],
        name: &str,
        hash: u32,
    ) -> Result<usize, usize> {
        debug_assert!(!slots.is_empty());

        let cap = slots.len();
        let mut index = mask_by_capacity(cap, hash as usize);

        loop {
            match &slots[index] {
                Some(slot) => {
                    let first = slot.positions.first() as usize;
                    if slot.hash == hash && entries[first].name.as_str() == name {
                        return Ok(index);
                    }
                }
                None => return Err(index),
            }

            // hash collision, open address linear probing
            index = mask_by_capacity(cap, index + 1);
        }
    }

    fn reserve_one(&mut self) {
        const DEFAULT_MIN_ALLOC: usize = 4;

        // more optimized form of `distinct / cap >= 3/4`, also handles
        // zero capacity
        let is_load_factor_exceeded = self.distinct * 4 >= self.slots.len() * 3;

        if is_load_factor_exceeded {
            let cap = if self.slots.is_empty() {
                DEFAULT_MIN_ALLOC
            } else {
                self.slots.len() << 1
            };
            self.rebuild_index(cap);
        }
    }

    fn rebuild_index(&mut self, cap: usize) {
        debug_assert!(cap.is_power_of_two() || cap == 0);

        let cap = if cap == 0 && !self.entries.is_empty() { 4 } else { cap };

        self.slots.clear();
        self.slots.resize(cap, None);
        self.distinct = 0;

        for position in 0..self.entries.len() {
            let hash = self.entries[position].name.hash();
            match Self::probe(
                &self.slots,
                &self.entries,
                self.entries[position].name.as_str(),
                hash,
            ) {
                Ok(index) => self.slot_mut(index).positions.push(position as u32),
                Err(vacant) => {
                    self.slots[vacant] = Some(Slot {
                        hash,
                        positions: Positions::One(position as u32),
                    });
                    self.distinct += 1;
                }
            }
        }
    }
}

// ===== Traits =====

impl std::fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
