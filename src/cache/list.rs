//! Arena-backed recency list.
//!
//! Entries live in a flat `Vec` of slots. Links between entries are slot
//! indices rather than pointers, so a stale link can only ever point at a
//! vacant slot, never at freed memory. Vacant slots are kept on a free-list
//! and reused by later inserts.
//!
//! The list runs from most-recently used (head) to least-recently used (tail).

/// Stable handle to an entry's storage slot.
pub(crate) type SlotId = usize;

/// Null link.
const NIL: SlotId = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: SlotId,
    next: SlotId,
}

#[derive(Debug)]
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<SlotId>,
    head: SlotId,
    tail: SlotId,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Insert a new entry at the front. Returns its slot.
    pub fn push_front(&mut self, key: K, value: V) -> SlotId {
        let node = Node {
            key,
            value,
            prev: NIL,
            next: NIL,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(id);
        self.len += 1;
        id
    }

    /// Move an existing entry to the front.
    pub fn move_to_front(&mut self, id: SlotId) {
        if self.head == id {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    /// Remove an entry and free its slot.
    pub fn remove(&mut self, id: SlotId) -> (K, V) {
        self.unlink(id);
        let node = self.slots[id]
            .take()
            .unwrap_or_else(|| vacant(id));
        self.free.push(id);
        self.len -= 1;
        (node.key, node.value)
    }

    /// Remove the least-recently used entry.
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        Some(self.remove(self.tail))
    }

    pub fn key(&self, id: SlotId) -> &K {
        &self.node(id).key
    }

    pub fn value(&self, id: SlotId) -> &V {
        &self.node(id).value
    }

    pub fn value_mut(&mut self, id: SlotId) -> &mut V {
        &mut self.node_mut(id).value
    }

    /// Drop every entry. The arena keeps its allocation for reuse.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    /// Iterate `(slot, key)` pairs from MRU to LRU.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Walk the list in both directions and check that links, length and
    /// the free-list agree with each other.
    pub fn check_links(&self) -> Result<(), String> {
        let mut forward = 0usize;
        let mut prev = NIL;
        let mut cursor = self.head;
        while cursor != NIL {
            let node = self.slots.get(cursor).and_then(Option::as_ref).ok_or_else(|| {
                format!("forward walk reached vacant slot {cursor}")
            })?;
            if node.prev != prev {
                return Err(format!(
                    "slot {cursor} has prev {} but was reached from {prev}",
                    node.prev
                ));
            }
            forward += 1;
            if forward > self.len {
                return Err(format!("forward walk exceeded length {}", self.len));
            }
            prev = cursor;
            cursor = node.next;
        }
        if prev != self.tail {
            return Err(format!("forward walk ended at {prev}, tail is {}", self.tail));
        }
        if forward != self.len {
            return Err(format!("forward walk saw {forward} entries, length is {}", self.len));
        }

        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        if occupied != self.len {
            return Err(format!("{occupied} occupied slots, length is {}", self.len));
        }
        if occupied + self.free.len() != self.slots.len() {
            return Err(format!(
                "{occupied} occupied + {} free != {} slots",
                self.free.len(),
                self.slots.len()
            ));
        }
        if let Some(&id) = self.free.iter().find(|&&id| self.slots[id].is_some()) {
            return Err(format!("free-list holds occupied slot {id}"));
        }
        Ok(())
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.node_mut(old_head).prev = id;
        } else {
            self.tail = id;
        }
        self.head = id;
    }

    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        if prev != NIL {
            self.node_mut(prev).next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.node_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }
        let node = self.node_mut(id);
        node.prev = NIL;
        node.next = NIL;
    }

    fn node(&self, id: SlotId) -> &Node<K, V> {
        self.slots
            .get(id)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| vacant(id))
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node<K, V> {
        self.slots
            .get_mut(id)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| vacant(id))
    }
}

/// A live link led to an empty slot: index and order have diverged.
#[cold]
#[track_caller]
fn vacant(id: SlotId) -> ! {
    panic!("internal inconsistency: slot {id} is vacant but still linked")
}

pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: SlotId,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (SlotId, &'a K);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let id = self.cursor;
        let node = self.list.node(id);
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((id, &node.key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
