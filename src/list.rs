//! Doubly linked recency list backing the DRAM tier.
//!
//! The list stores heap-allocated nodes addressed by raw pointers so that a
//! hash index can hold a stable back-reference to every node and reposition
//! it in O(1). Sentinel nodes at both ends keep the link surgery branch-free.
//!
//! This module is internal infrastructure: it exposes unsafe raw pointer
//! operations that require careful invariant maintenance. The DRAM tier is
//! the only consumer.

use core::fmt;
use core::mem;
use core::ptr::{self, NonNull};

/// A node in the recency list.
///
/// Sentinel nodes leave the value uninitialized, which is why the value is
/// wrapped in `MaybeUninit` and only reachable through unsafe accessors.
pub(crate) struct Node<T> {
    val: mem::MaybeUninit<T>,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new_sigil() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes, whose value is initialized.
    pub(crate) unsafe fn value(&self) -> &T {
        self.val.assume_init_ref()
    }

    /// Mutably borrows the stored value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes, whose value is initialized.
    pub(crate) unsafe fn value_mut(&mut self) -> &mut T {
        self.val.assume_init_mut()
    }

    /// Consumes a detached node and moves its value out.
    ///
    /// Safe because every `Box<Node<T>>` handed out by this module wraps a
    /// non-sigil node with an initialized value.
    pub(crate) fn into_value(self: Box<Self>) -> T {
        // SAFETY: only non-sigil nodes are ever returned as boxes, and the
        // MaybeUninit wrapper means the value is not dropped a second time
        // when the box itself is freed.
        unsafe { self.val.assume_init() }
    }
}

/// Doubly linked list with O(1) front insertion, back removal and in-place
/// repositioning of arbitrary nodes.
///
/// Front = most recently used, back = least recently used. The list itself
/// imposes no capacity; the owning tier bounds residency by byte accounting.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Node<T>,
    tail: *mut Node<T>,
}

impl<T> List<T> {
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Node::new_sigil()));
        let tail = Box::into_raw(Box::new(Node::new_sigil()));

        let list = List { len: 0, head, tail };

        unsafe {
            // SAFETY: head and tail are newly allocated and valid.
            (*list.head).next = list.tail;
            (*list.tail).prev = list.head;
        }

        list
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unlinks a node from its neighbors without deallocating it.
    ///
    /// # Safety
    ///
    /// `node` must be a valid non-sigil node currently linked into this list.
    unsafe fn detach(&mut self, node: *mut Node<T>) {
        // SAFETY: a linked node has valid prev and next pointers.
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// Links a node directly after the head sentinel.
    ///
    /// # Safety
    ///
    /// `node` must be valid and not currently linked into any list.
    unsafe fn attach_front(&mut self, node: *mut Node<T>) {
        (*node).next = (*self.head).next;
        (*node).prev = self.head;
        (*self.head).next = node;
        (*(*node).next).prev = node;
    }

    /// Inserts a value at the front and returns a stable pointer to its node.
    ///
    /// The pointer stays valid until the node is removed from the list.
    pub(crate) fn push_front(&mut self, v: T) -> *mut Node<T> {
        // SAFETY: Box::into_raw never returns null.
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Node::new(v)))) };
        // SAFETY: the node is newly allocated and not part of any list yet.
        unsafe { self.attach_front(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Removes and returns the back (least recently used) node.
    pub(crate) fn pop_back(&mut self) -> Option<Box<Node<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is non-empty, so the node before the tail sentinel
        // is a real node.
        let prev = unsafe { (*self.tail).prev };
        debug_assert!(prev != self.head);
        unsafe {
            self.detach(prev);
        }
        self.len -= 1;
        // SAFETY: prev was allocated by push_front and is now detached.
        unsafe { Some(Box::from_raw(prev)) }
    }

    /// Removes the given node from the list and returns its box.
    ///
    /// # Safety
    ///
    /// `node` must be a valid non-sigil node currently linked into this list.
    pub(crate) unsafe fn remove(&mut self, node: *mut Node<T>) -> Option<Box<Node<T>>> {
        if node.is_null() || node == self.head || node == self.tail {
            return None;
        }
        unsafe {
            self.detach(node);
            self.len -= 1;
            Some(Box::from_raw(node))
        }
    }

    /// Moves a node to the front (most recently used position).
    ///
    /// # Safety
    ///
    /// `node` must be a valid non-sigil node currently linked into this list.
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Node<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }
        if (*self.head).next == node {
            return;
        }
        self.detach(node);
        self.attach_front(node);
    }

    /// Removes all nodes, dropping their values.
    pub(crate) fn clear(&mut self) {
        while let Some(node) = self.pop_back() {
            drop(node.into_value());
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: the sentinels were allocated in `new` and are freed exactly
        // once here; their MaybeUninit values are never dropped.
        unsafe {
            let _ = Box::from_raw(self.head);
            let _ = Box::from_raw(self.tail);
            self.head = ptr::null_mut();
            self.tail = ptr::null_mut();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("length", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_list_is_empty() {
        let list = List::<u32>::new();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert!(!list.head.is_null());
        assert!(!list.tail.is_null());
    }

    #[test]
    fn test_push_and_pop_order() {
        let mut list = List::<u32>::new();
        list.push_front(10);
        list.push_front(20);
        list.push_front(30);
        assert_eq!(list.len(), 3);

        // Back is the oldest insertion.
        assert_eq!(list.pop_back().unwrap().into_value(), 10);
        assert_eq!(list.pop_back().unwrap().into_value(), 20);
        assert_eq!(list.pop_back().unwrap().into_value(), 30);
        assert!(list.pop_back().is_none());
    }

    #[test]
    fn test_move_to_front_changes_eviction_order() {
        let mut list = List::<u32>::new();
        let node1 = list.push_front(10);
        let _node2 = list.push_front(20);
        let _node3 = list.push_front(30);

        // 10 was the eviction candidate; touching it protects it.
        unsafe {
            list.move_to_front(node1);
        }
        assert_eq!(list.len(), 3);

        assert_eq!(list.pop_back().unwrap().into_value(), 20);
        assert_eq!(list.pop_back().unwrap().into_value(), 30);
        assert_eq!(list.pop_back().unwrap().into_value(), 10);
    }

    #[test]
    fn test_move_front_node_is_a_noop() {
        let mut list = List::<u32>::new();
        let _node1 = list.push_front(10);
        let node2 = list.push_front(20);

        unsafe {
            list.move_to_front(node2);
        }
        assert_eq!(list.len(), 2);
        assert_eq!(list.pop_back().unwrap().into_value(), 10);
        assert_eq!(list.pop_back().unwrap().into_value(), 20);
    }

    #[test]
    fn test_remove_interior_node() {
        let mut list = List::<u32>::new();
        let _node1 = list.push_front(10);
        let node2 = list.push_front(20);
        let _node3 = list.push_front(30);

        let removed = unsafe { list.remove(node2) }.unwrap();
        assert_eq!(removed.into_value(), 20);
        assert_eq!(list.len(), 2);

        assert_eq!(list.pop_back().unwrap().into_value(), 10);
        assert_eq!(list.pop_back().unwrap().into_value(), 30);
    }

    #[test]
    fn test_value_accessors() {
        let mut list = List::<String>::new();
        let node = list.push_front(String::from("test"));

        unsafe {
            assert_eq!((*node).value(), "test");
            (*node).value_mut().push_str("_modified");
            assert_eq!((*node).value(), "test_modified");
        }
    }

    #[test]
    fn test_clear_drops_values() {
        let mut list = List::<String>::new();
        list.push_front(String::from("a"));
        list.push_front(String::from("b"));
        list.clear();
        assert!(list.is_empty());

        // The list stays usable after a clear.
        list.push_front(String::from("c"));
        assert_eq!(list.len(), 1);
    }
}
