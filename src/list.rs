use crate::error::DynError;
use crate::tag::TypeTag;
use crate::value::DynVar;
use std::fmt::Write as _;
use std::iter::FusedIterator;
use std::mem::size_of;

/// One element of a [`DynList`]: an owned payload plus its links.
///
/// Nodes are only reachable through [`DynList::get`] and the list iterators, and
/// only for reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    data: DynVar,
    next: Option<usize>,
    prev: Option<usize>,
}

impl Node {
    /// The stored payload.
    pub fn data(&self) -> &DynVar {
        &self.data
    }

    /// Type of the stored payload.
    pub fn tag(&self) -> Option<TypeTag> {
        self.data.tag()
    }

    /// Width of one unit of the payload: the scalar width, 1 for strings.
    pub fn element_size(&self) -> usize {
        self.tag().map_or(0, TypeTag::unit_size)
    }

    /// Bytes of payload owned by this node.
    pub fn data_size(&self) -> usize {
        self.data.node_data_size()
    }
}

/// A doubly-linked list of independently-typed values.
///
/// Used only through [`push`](DynList::push)/[`pop`](DynList::pop) it is a stack;
/// used only through [`enqueue`](DynList::enqueue)/[`dequeue`](DynList::dequeue) it
/// is a queue. Elements can also be inserted, replaced and removed anywhere.
///
/// Every node owns a deep copy of the value it was given. The list keeps running
/// totals of its node count, payload bytes, and payload plus bookkeeping bytes.
///
/// Index handling differs from [`DynArray`](crate::DynArray): inserting or removing
/// past either end clamps to that end instead of failing.
///
/// # Examples
///
/// ```
/// use sovran_dyn::{DynError, DynList, DynVar};
///
/// fn main() -> Result<(), DynError> {
///     let mut list = DynList::new();
///     list.push(&DynVar::from("a"))?;
///     list.push(&DynVar::from("b"))?;
///     list.push(&DynVar::from("c"))?;
///
///     list.pop();
///     assert_eq!(list.render(", "), "a, b, ");
///
///     list.remove_at_front();
///     assert_eq!(list.render(", "), "b, ");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DynList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    count: usize,
    size: usize,
    total_size: usize,
}

impl Default for DynList {
    fn default() -> Self {
        Self::new()
    }
}

impl DynList {
    /// Bytes charged for the list itself.
    pub const HEADER_SIZE: usize = size_of::<DynList>();

    /// Bookkeeping bytes charged per node on top of its payload.
    pub const NODE_OVERHEAD: usize = size_of::<Node>();

    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            count: 0,
            size: 0,
            total_size: Self::HEADER_SIZE,
        }
    }

    /// Number of nodes.
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when the list has no nodes.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Payload bytes owned by all nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Payload bytes plus per-node and header bookkeeping.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Payload of the head node.
    pub fn front(&self) -> Option<&DynVar> {
        self.head.and_then(|idx| self.node(idx)).map(Node::data)
    }

    /// Payload of the tail node.
    pub fn back(&self) -> Option<&DynVar> {
        self.tail.and_then(|idx| self.node(idx)).map(Node::data)
    }

    /// Appends a copy of `data` at the tail.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::UnsupportedType` for an empty value
    /// - Returns `DynError::AllocationFailure` if the node cannot be allocated; the
    ///   list is unchanged
    pub fn push_back(&mut self, data: &DynVar) -> Result<(), DynError> {
        let idx = self.alloc_node(data, "DynList::push_back")?;
        match self.tail {
            Some(tail) => {
                self.set_next(tail, Some(idx));
                self.set_prev(idx, Some(tail));
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.account_linked(idx);
        Ok(())
    }

    /// Prepends a copy of `data` at the head. Errors as [`push_back`](Self::push_back).
    pub fn push_front(&mut self, data: &DynVar) -> Result<(), DynError> {
        let idx = self.alloc_node(data, "DynList::push_front")?;
        match self.head {
            Some(head) => {
                self.set_prev(head, Some(idx));
                self.set_next(idx, Some(head));
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.account_linked(idx);
        Ok(())
    }

    /// Removes the tail node and hands back its payload. Does nothing on an empty list.
    pub fn pop_back(&mut self) -> Option<DynVar> {
        let tail = self.tail?;
        match self.node(tail).and_then(|node| node.prev) {
            Some(prev) => {
                self.set_next(prev, None);
                self.tail = Some(prev);
            }
            None => {
                self.head = None;
                self.tail = None;
            }
        }
        self.release(tail)
    }

    /// Removes the head node and hands back its payload. Does nothing on an empty list.
    pub fn remove_at_front(&mut self) -> Option<DynVar> {
        if self.count <= 1 {
            return self.pop_back();
        }
        let head = self.head?;
        let next = self.node(head).and_then(|node| node.next);
        self.set_prev(next?, None);
        self.head = next;
        self.release(head)
    }

    /// Removes the node at `index`. An index at or past the end removes the tail,
    /// index 0 removes the head.
    pub fn remove_at(&mut self, index: usize) -> Option<DynVar> {
        if index >= self.count {
            tracing::debug!(index, count = self.count, "remove index clamped to the tail");
            return self.pop_back();
        }
        if index == 0 {
            return self.remove_at_front();
        }
        if index == self.count - 1 {
            return self.pop_back();
        }

        let idx = self.locate(index)?;
        let (prev, next) = self.node(idx).map(|node| (node.prev, node.next))?;
        if let Some(prev) = prev {
            self.set_next(prev, next);
        }
        if let Some(next) = next {
            self.set_prev(next, prev);
        }
        self.release(idx)
    }

    /// Inserts a copy of `data` so that it ends up at `index`. An index at or past the
    /// end appends at the tail, index 0 prepends at the head.
    ///
    /// # Errors
    ///
    /// As [`push_back`](Self::push_back).
    pub fn insert_at(&mut self, index: usize, data: &DynVar) -> Result<(), DynError> {
        if index >= self.count {
            tracing::debug!(index, count = self.count, "insert index clamped to the tail");
            return self.push_back(data);
        }
        if index == 0 {
            return self.push_front(data);
        }

        let Some(at) = self.locate(index) else {
            return Err(DynError::IndexOutOfRange {
                index,
                len: self.count,
            }
            .logged("DynList::insert_at"));
        };
        let prev = self.node(at).and_then(|node| node.prev);
        let idx = self.alloc_node(data, "DynList::insert_at")?;

        self.set_prev(idx, prev);
        self.set_next(idx, Some(at));
        if let Some(prev) = prev {
            self.set_next(prev, Some(idx));
        }
        self.set_prev(at, Some(idx));
        self.account_linked(idx);
        Ok(())
    }

    /// Replaces the node at `index` with a new node holding a copy of `data`.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::IndexOutOfRange` if `index` is not below the count
    /// - Otherwise as [`push_back`](Self::push_back); the old node stays in place
    pub fn set_at(&mut self, index: usize, data: &DynVar) -> Result<(), DynError> {
        if index >= self.count {
            return Err(DynError::IndexOutOfRange {
                index,
                len: self.count,
            }
            .logged("DynList::set_at"));
        }
        let Some(old) = self.locate(index) else {
            return Err(DynError::IndexOutOfRange {
                index,
                len: self.count,
            }
            .logged("DynList::set_at"));
        };
        let replacement = self.alloc_node(data, "DynList::set_at")?;
        let (prev, next) = self
            .node(old)
            .map(|node| (node.prev, node.next))
            .unwrap_or_default();

        if index == 0 {
            if self.count > 1 {
                self.set_next(replacement, next);
                if let Some(next) = next {
                    self.set_prev(next, Some(replacement));
                }
            } else {
                self.tail = Some(replacement);
            }
            self.head = Some(replacement);
        } else if index == self.count - 1 {
            self.set_prev(replacement, prev);
            if let Some(prev) = prev {
                self.set_next(prev, Some(replacement));
            }
            self.tail = Some(replacement);
        } else {
            self.set_prev(replacement, prev);
            self.set_next(replacement, next);
            if let Some(prev) = prev {
                self.set_next(prev, Some(replacement));
            }
            if let Some(next) = next {
                self.set_prev(next, Some(replacement));
            }
        }

        let old_size = self.node(old).map_or(0, Node::data_size);
        let new_size = self.node(replacement).map_or(0, Node::data_size);
        self.size = self.size - old_size + new_size;
        self.total_size = self.total_size - old_size + new_size;
        self.free_slot(old);
        Ok(())
    }

    /// The node at `index`, walking from whichever end is closer.
    pub fn get(&self, index: usize) -> Option<&Node> {
        if index >= self.count {
            DynError::IndexOutOfRange {
                index,
                len: self.count,
            }
            .report("DynList::get");
            return None;
        }
        self.locate(index).and_then(|idx| self.node(idx))
    }

    /// Position of the first node whose payload has the same byte length and bytes as
    /// `data`.
    ///
    /// Only the payload bytes are compared, not the tags, so an `Int` node matches an
    /// equal `UInt` query. Nested variants are never located: `Var` nodes are skipped
    /// and a `Var` query always returns `None`.
    pub fn index_of(&self, data: &DynVar) -> Option<usize> {
        if matches!(data, DynVar::Var(_)) {
            return None;
        }
        let wanted = data.payload_bytes();
        self.iter().position(|node| {
            !matches!(node.data, DynVar::Var(_))
                && node.data.byte_len() == data.byte_len()
                && node.data.payload_bytes() == wanted
        })
    }

    /// Nodes from head to tail. Reverse it for tail to head.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.count,
        }
    }

    /// Payloads from tail to head.
    pub fn iter_rev(&self) -> std::iter::Rev<NodeIter<'_>> {
        self.iter().rev()
    }

    /// Renders every payload followed by `separator`. Payloads without a text form are
    /// skipped with a diagnostic.
    pub fn render(&self, separator: &str) -> String {
        let mut out = String::new();
        for node in self.iter() {
            match node.data.render_payload() {
                Some(text) => {
                    out.push_str(&text);
                    out.push_str(separator);
                }
                None => {
                    DynError::unsupported(node.tag()).report("DynList::render");
                }
            }
        }
        out
    }

    /// Renders the payload at `index` followed by `separator`.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::IndexOutOfRange` if `index` is not below the count
    /// - Returns `DynError::UnsupportedType` if the payload has no text form
    pub fn render_at(&self, index: usize, separator: &str) -> Result<String, DynError> {
        let node = self.get(index).ok_or(DynError::IndexOutOfRange {
            index,
            len: self.count,
        })?;
        node.data.render(separator)
    }

    /// Renders the payloads followed by the count and both size totals.
    pub fn render_all(&self, separator: &str) -> String {
        let mut out = format!("Elements: {}\n", self.render(separator));
        let _ = writeln!(out, "Count = {}", self.count);
        let _ = writeln!(out, "Size = {} bytes", self.size);
        let _ = writeln!(out, "TotalSize = {} bytes", self.total_size);
        out
    }

    /// Drops every node (nested variants included) and resets the totals.
    /// Clearing an empty list is a no-op.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.count = 0;
        self.size = 0;
        self.total_size = Self::HEADER_SIZE;
    }

    /// Stack push: appends at the tail.
    pub fn push(&mut self, data: &DynVar) -> Result<(), DynError> {
        self.push_back(data)
    }

    /// Stack pop: removes the tail.
    pub fn pop(&mut self) -> Option<DynVar> {
        self.pop_back()
    }

    /// Queue enqueue: prepends at the head, so that [`dequeue`](Self::dequeue) sees
    /// elements in arrival order.
    pub fn enqueue(&mut self, data: &DynVar) -> Result<(), DynError> {
        self.push_front(data)
    }

    /// Queue dequeue: removes the tail.
    pub fn dequeue(&mut self) -> Option<DynVar> {
        self.pop_back()
    }

    fn node(&self, idx: usize) -> Option<&Node> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = self.node_mut(idx) {
            node.next = next;
        }
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = self.node_mut(idx) {
            node.prev = prev;
        }
    }

    /// Slot index of the node at `index`, walking from the closer end.
    fn locate(&self, index: usize) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        if index <= self.count / 2 {
            let mut cursor = self.head?;
            for _ in 0..index {
                cursor = self.node(cursor)?.next?;
            }
            Some(cursor)
        } else {
            let mut cursor = self.tail?;
            for _ in index..self.count - 1 {
                cursor = self.node(cursor)?.prev?;
            }
            Some(cursor)
        }
    }

    /// Stores an unlinked deep copy of `data` and returns its slot.
    fn alloc_node(&mut self, data: &DynVar, operation: &'static str) -> Result<usize, DynError> {
        if data.is_empty() {
            return Err(DynError::unsupported(None).logged(operation));
        }
        let node = Node {
            data: data.copy(),
            next: None,
            prev: None,
        };
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            return Ok(idx);
        }
        self.slots
            .try_reserve(1)
            .map_err(|e| DynError::allocation(self.count + 1, e).logged(operation))?;
        self.slots.push(Some(node));
        Ok(self.slots.len() - 1)
    }

    fn account_linked(&mut self, idx: usize) {
        let data_size = self.node(idx).map_or(0, Node::data_size);
        self.count += 1;
        self.size += data_size;
        self.total_size += data_size + Self::NODE_OVERHEAD;
    }

    /// Frees an already unlinked node, updating the totals.
    fn release(&mut self, idx: usize) -> Option<DynVar> {
        let node = self.free_slot(idx)?;
        let data_size = node.data_size();
        self.count -= 1;
        self.size -= data_size;
        self.total_size -= data_size + Self::NODE_OVERHEAD;
        Some(node.data)
    }

    fn free_slot(&mut self, idx: usize) -> Option<Node> {
        let node = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(node)
    }
}

/// Iterator over the nodes of a [`DynList`], double-ended.
#[derive(Debug, Clone)]
pub struct NodeIter<'a> {
    list: &'a DynList,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for NodeIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(node)
    }
}

impl ExactSizeIterator for NodeIter<'_> {}

impl FusedIterator for NodeIter<'_> {}

impl<'a> IntoIterator for &'a DynList {
    type Item = &'a Node;
    type IntoIter = NodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &DynList) -> Vec<String> {
        list.iter().map(|node| node.data().to_string()).collect()
    }

    /// Walks both directions and checks every link and total against the chain.
    fn assert_consistent(list: &DynList) {
        let forward: Vec<&Node> = list.iter().collect();
        let mut backward: Vec<&Node> = list.iter_rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), list.count());

        let size: usize = forward.iter().map(|node| node.data_size()).sum();
        assert_eq!(list.size(), size);
        assert_eq!(
            list.total_size(),
            DynList::HEADER_SIZE + size + DynList::NODE_OVERHEAD * list.count()
        );

        if let Some(head) = list.head {
            assert_eq!(list.node(head).and_then(|n| n.prev), None);
        }
        if let Some(tail) = list.tail {
            assert_eq!(list.node(tail).and_then(|n| n.next), None);
        }
        assert_eq!(list.head.is_none(), list.is_empty());
        assert_eq!(list.tail.is_none(), list.is_empty());
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut list = DynList::new();
        list.push(&DynVar::Int(1)).unwrap();
        list.push(&DynVar::Int(2)).unwrap();
        list.pop();
        list.push(&DynVar::Int(3)).unwrap();
        assert_eq!(list.slots.len(), 2);
        assert_eq!(strings(&list), ["1", "3"]);
        assert_consistent(&list);
    }

    #[test]
    fn test_set_at_every_position() {
        let mut single = DynList::new();
        single.push(&DynVar::Int(1)).unwrap();
        single.set_at(0, &DynVar::from("one")).unwrap();
        assert_eq!(strings(&single), ["one"]);
        assert_consistent(&single);

        let mut list = DynList::new();
        for n in 0..4 {
            list.push(&DynVar::Int(n)).unwrap();
        }
        list.set_at(0, &DynVar::from("head")).unwrap();
        list.set_at(3, &DynVar::from("tail")).unwrap();
        list.set_at(2, &DynVar::Double(2.5)).unwrap();
        assert_eq!(strings(&list), ["head", "1", "2.5", "tail"]);
        assert_consistent(&list);
    }

    #[test]
    fn test_middle_insert_and_remove_keep_links() {
        let mut list = DynList::new();
        for n in 0..5 {
            list.push(&DynVar::Short(n)).unwrap();
        }
        list.insert_at(3, &DynVar::Short(30)).unwrap();
        assert_consistent(&list);
        assert_eq!(strings(&list), ["0", "1", "2", "30", "3", "4"]);

        assert_eq!(list.remove_at(4), Some(DynVar::Short(3)));
        assert_eq!(list.remove_at(1), Some(DynVar::Short(1)));
        assert_consistent(&list);
        assert_eq!(strings(&list), ["0", "2", "30", "4"]);
    }

    #[test]
    fn test_remove_last_index_moves_tail() {
        let mut list = DynList::new();
        for n in 0..3 {
            list.push(&DynVar::Int(n)).unwrap();
        }
        assert_eq!(list.remove_at(2), Some(DynVar::Int(2)));
        assert_eq!(list.back(), Some(&DynVar::Int(1)));
        assert_consistent(&list);

        // the freed slot is reused for the new tail
        list.push(&DynVar::Int(3)).unwrap();
        assert_eq!(strings(&list), ["0", "1", "3"]);
        assert_eq!(list.iter_rev().count(), 3);
        assert_consistent(&list);
    }

    #[test]
    fn test_empty_value_is_rejected() {
        let mut list = DynList::new();
        let err = list.push(&DynVar::Empty).unwrap_err();
        assert_eq!(err, DynError::UnsupportedType { tag: 0 });
        assert!(list.is_empty());
        assert_eq!(list.total_size(), DynList::HEADER_SIZE);
    }
}
