//! Object heap and mark-and-sweep garbage collector.
//!
//! Objects live in an arena of slots addressed by [`ObjRef`] handles
//! (slot index + generation). Freed slots go onto a free list and get a new
//! generation when reused, so a handle that outlived its object is detected
//! instead of silently aliasing a newer one.
//!
//! The heap knows nothing about the interpreter: the caller supplies the
//! root set to [`Heap::collect`]. Pinned slots are additional roots.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::object::{Object, Trace};
use crate::value::Value;

/// Handle to a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

/// Allocation counters, reported by `print_gc_info()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapStats {
    /// Objects currently allocated.
    pub live: usize,
    /// Objects ever allocated.
    pub allocated_total: usize,
    /// Collections run so far.
    pub collections: usize,
    /// Objects ever reclaimed.
    pub freed_total: usize,
}

#[derive(Debug)]
struct Slot {
    object: Option<Object>,
    generation: u32,
    marked: bool,
    pins: u32,
}

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    stats: HeapStats,
    since_collect: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` and return a handle to it.
    pub fn alloc(&mut self, object: Object) -> ObjRef {
        trace!(kind = object.type_name(), "alloc");
        self.stats.live += 1;
        self.stats.allocated_total += 1;
        self.since_collect += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.object = Some(object);
            slot.marked = false;
            slot.pins = 0;
            return ObjRef {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).expect("heap exceeded u32::MAX slots");
        self.slots.push(Slot {
            object: Some(object),
            generation: 0,
            marked: false,
            pins: 0,
        });
        ObjRef {
            index,
            generation: 0,
        }
    }

    fn slot(&self, r: ObjRef) -> &Slot {
        let slot = &self.slots[r.index as usize];
        assert!(
            slot.generation == r.generation && slot.object.is_some(),
            "stale object handle {r:?}"
        );
        slot
    }

    fn slot_mut(&mut self, r: ObjRef) -> &mut Slot {
        let slot = &mut self.slots[r.index as usize];
        assert!(
            slot.generation == r.generation && slot.object.is_some(),
            "stale object handle {r:?}"
        );
        slot
    }

    pub fn get(&self, r: ObjRef) -> &Object {
        self.slot(r)
            .object
            .as_ref()
            .expect("live slot holds an object")
    }

    pub fn get_mut(&mut self, r: ObjRef) -> &mut Object {
        self.slot_mut(r)
            .object
            .as_mut()
            .expect("live slot holds an object")
    }

    /// Whether `r` still refers to a live object.
    pub fn contains(&self, r: ObjRef) -> bool {
        self.slots
            .get(r.index as usize)
            .is_some_and(|s| s.generation == r.generation && s.object.is_some())
    }

    /// Keep `r` alive regardless of reachability until a matching [`unpin`](Self::unpin).
    pub fn pin(&mut self, r: ObjRef) {
        self.slot_mut(r).pins += 1;
    }

    pub fn unpin(&mut self, r: ObjRef) {
        let slot = self.slot_mut(r);
        slot.pins = slot.pins.saturating_sub(1);
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Allocations since the last collection.
    pub fn pending(&self) -> usize {
        self.since_collect
    }

    /// Mark everything reachable from `roots` and pinned slots, then free the
    /// rest. Returns the number of objects freed.
    pub fn collect(&mut self, roots: impl IntoIterator<Item = Value>) -> usize {
        let mut worklist: Vec<ObjRef> = roots.into_iter().filter_map(Value::as_obj).collect();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.pins > 0 && slot.object.is_some() {
                worklist.push(ObjRef {
                    index: index as u32,
                    generation: slot.generation,
                });
            }
        }

        while let Some(r) = worklist.pop() {
            let slot = self.slot_mut(r);
            if slot.marked {
                continue;
            }
            slot.marked = true;
            if let Some(object) = &slot.object {
                object.trace(&mut |v| {
                    if let Value::Obj(child) = v {
                        worklist.push(child);
                    }
                });
            }
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_none() {
                continue;
            }
            if slot.marked {
                slot.marked = false;
            } else {
                slot.object = None;
                self.free.push(index as u32);
                freed += 1;
            }
        }

        self.stats.live -= freed;
        self.stats.freed_total += freed;
        self.stats.collections += 1;
        self.since_collect = 0;
        debug!(live = self.stats.live, freed, "gc collection");
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ROOTS: [Value; 0] = [];

    fn string(heap: &mut Heap, s: &str) -> ObjRef {
        heap.alloc(Object::String(s.to_string()))
    }

    #[test]
    fn test_unreachable_objects_are_freed() {
        let mut heap = Heap::new();
        let kept = string(&mut heap, "kept");
        let dropped = string(&mut heap, "dropped");
        assert_eq!(heap.collect([Value::Obj(kept)]), 1);
        assert!(heap.contains(kept));
        assert!(!heap.contains(dropped));
        assert_eq!(heap.stats().live, 1);
        assert_eq!(heap.stats().freed_total, 1);
    }

    #[test]
    fn test_list_elements_are_traced() {
        let mut heap = Heap::new();
        let a = string(&mut heap, "a");
        let list = heap.alloc(Object::List(vec![Value::Int(1), Value::Obj(a)]));
        heap.collect([Value::Obj(list)]);
        assert!(heap.contains(a));
    }

    #[test]
    fn test_cycles_are_collected() {
        let mut heap = Heap::new();
        let list = heap.alloc(Object::List(Vec::new()));
        if let Object::List(items) = heap.get_mut(list) {
            items.push(Value::Obj(list));
        }
        heap.collect([Value::Obj(list)]);
        assert!(heap.contains(list));
        assert_eq!(heap.collect(NO_ROOTS), 1);
        assert!(!heap.contains(list));
    }

    #[test]
    fn test_iterator_keeps_source_alive() {
        let mut heap = Heap::new();
        let source = string(&mut heap, "abc");
        let iter = heap.alloc(Object::StringIter { source, pos: 0 });
        heap.collect([Value::Obj(iter)]);
        assert!(heap.contains(source));
    }

    #[test]
    fn test_pinned_objects_survive() {
        let mut heap = Heap::new();
        let s = string(&mut heap, "pinned");
        heap.pin(s);
        heap.collect(NO_ROOTS);
        assert!(heap.contains(s));
        heap.unpin(s);
        heap.collect(NO_ROOTS);
        assert!(!heap.contains(s));
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut heap = Heap::new();
        let old = string(&mut heap, "old");
        heap.collect(NO_ROOTS);
        let new = string(&mut heap, "new");
        assert_ne!(old, new);
        assert!(!heap.contains(old));
        assert!(heap.contains(new));
    }

    #[test]
    #[should_panic(expected = "stale object handle")]
    fn test_stale_handle_panics() {
        let mut heap = Heap::new();
        let old = string(&mut heap, "old");
        heap.collect(NO_ROOTS);
        let _ = heap.get(old);
    }

    #[test]
    fn test_pending_resets_after_collect() {
        let mut heap = Heap::new();
        string(&mut heap, "a");
        string(&mut heap, "b");
        assert_eq!(heap.pending(), 2);
        heap.collect(NO_ROOTS);
        assert_eq!(heap.pending(), 0);
        assert_eq!(heap.stats().collections, 1);
    }
}
