//! Intrusive MRU/LRU list.
//!
//! The list threads through the `prev`/`next` links stored in each entry's
//! [`EntryState`](crate::entry::EntryState); it never allocates. The head is
//! the most recently released entry and the tail is the eviction victim.
//!
//! Only unpinned entries are linked. The cache detaches an entry when its pin
//! count leaves zero and attaches it at the head when the count drops back.

use crate::entry::{CacheEntry, Link};
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Doubly linked list of cache entries, head = MRU, tail = LRU.
pub(crate) struct List<K, V> {
    /// Most recently released entry.
    head: Link<K, V>,
    /// Least recently released entry.
    tail: Link<K, V>,
    /// Current number of linked entries.
    len: usize,
}

impl<K, V> List<K, V> {
    pub(crate) const fn new() -> Self {
        List {
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Most recently released entry.
    pub(crate) fn head(&self) -> Link<K, V> {
        self.head
    }

    /// Least recently released entry.
    pub(crate) fn tail(&self) -> Link<K, V> {
        self.tail
    }

    /// Attaches a node at the head of the list.
    ///
    /// # Safety
    ///
    /// The caller must hold the owning cache's lock, and `node` must point to
    /// a live entry of that cache that is not currently linked.
    pub(crate) unsafe fn attach(&mut self, node: NonNull<CacheEntry<K, V>>) {
        // SAFETY: the caller holds the cache lock, so no one else touches the
        // states of `node` or the current head.
        unsafe {
            let state = node.as_ref().state();
            (*state).prev = None;
            (*state).next = self.head;
            match self.head {
                Some(old_head) => (*old_head.as_ref().state()).prev = Some(node),
                None => self.tail = Some(node),
            }
        }
        self.head = Some(node);
        self.len += 1;
    }

    /// Unlinks a node from anywhere in the list.
    ///
    /// # Safety
    ///
    /// The caller must hold the owning cache's lock, and `node` must point to
    /// an entry currently linked in this list.
    pub(crate) unsafe fn detach(&mut self, node: NonNull<CacheEntry<K, V>>) {
        // SAFETY: the caller holds the cache lock and guarantees that `node`
        // and therefore its neighbours are linked in this list.
        unsafe {
            let state = node.as_ref().state();
            let prev = (*state).prev;
            let next = (*state).next;
            match prev {
                Some(p) => (*p.as_ref().state()).next = next,
                None => self.head = next,
            }
            match next {
                Some(n) => (*n.as_ref().state()).prev = prev,
                None => self.tail = prev,
            }
            (*state).prev = None;
            (*state).next = None;
        }
        self.len -= 1;
    }

    /// Iterates from the MRU head to the LRU tail.
    ///
    /// # Safety
    ///
    /// The caller must hold the owning cache's lock for the whole iteration.
    pub(crate) unsafe fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.head,
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for List<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("length", &self.len)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish()
    }
}

/// Iterator over linked entries, MRU first.
pub(crate) struct Iter<'a, K, V> {
    next: Link<K, V>,
    _marker: PhantomData<&'a List<K, V>>,
}

impl<K, V> Iterator for Iter<'_, K, V> {
    type Item = NonNull<CacheEntry<K, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: `List::iter` requires the cache lock to be held, so links
        // are stable for the iterator's lifetime.
        self.next = unsafe { (*node.as_ref().state()).next };
        Some(node)
    }
}
