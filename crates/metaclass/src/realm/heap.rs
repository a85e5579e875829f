//! Object arena
//!
//! Objects are never freed individually; the whole arena is dropped with the
//! realm.

use super::object::HeapObject;

/// Object identifier (index into the realm heap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    /// Get the raw index
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Arena of heap objects
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object and return its id
    pub fn allocate(&mut self, object: HeapObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Get an object by id
    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.0 as usize)
    }

    /// Get a mutable object by id
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject> {
        self.objects.get_mut(id.0 as usize)
    }

    /// Number of allocated objects
    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::object::ObjectKind;

    #[test]
    fn test_allocate_assigns_sequential_ids() {
        let mut heap = Heap::new();
        let a = heap.allocate(HeapObject::new(None, ObjectKind::Ordinary));
        let b = heap.allocate(HeapObject::new(Some(a), ObjectKind::Ordinary));

        assert_eq!(a.as_u32(), 0);
        assert_eq!(b.as_u32(), 1);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(b).and_then(|o| o.prototype()), Some(a));
        assert!(heap.get(ObjectId(7)).is_none());
    }
}
