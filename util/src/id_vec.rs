use std::marker::PhantomData;

/// Vec wrapper that hands out typed indexes.
///
/// Values are only ever appended, so an id stays valid for the lifetime
/// of the collection.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, V> IdVec<K, V> {
    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vec: Vec::with_capacity(cap),
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Iterate through values in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.vec.iter()
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Push `v`, returning the id it can be retrieved with later.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        let id = self.vec.len().into();
        self.vec.push(v);
        id
    }

    /// Iterate through (id, value) pairs in insertion order.
    pub fn iter_ids(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.vec.iter().enumerate().map(|(i, v)| (i.into(), v))
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    #[inline]
    pub fn get(&self, k: K) -> &V {
        &self.vec[k.into()]
    }

    #[inline]
    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.vec[k.into()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Id(usize);

    impl From<usize> for Id {
        fn from(i: usize) -> Self {
            Id(i)
        }
    }

    impl From<Id> for usize {
        fn from(id: Id) -> Self {
            id.0
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut v: IdVec<Id, &str> = IdVec::with_capacity(2);
        let a = v.push("a");
        let b = v.push("b");
        assert_eq!(a, Id(0));
        assert_eq!(b, Id(1));
        assert_eq!(*v.get(b), "b");
        *v.get_mut(a) = "z";
        let ids: Vec<_> = v.iter_ids().collect();
        assert_eq!(ids, vec![(Id(0), &"z"), (Id(1), &"b")]);
    }
}
