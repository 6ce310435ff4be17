/// A helper data structure that behaves like a HashMap, but is based on a vector.
/// It can be used if the key is essentially a usize (i.e. implements Into<usize>).
/// It is wasteful if we try to insert sparse data (when we expect a lot of unpopulated elements in the middle).
/// It is a good candidate for arena handles, which are handed out densely from zero.
pub mod vector_map {
    use std::marker::PhantomData;

    #[derive(Clone, Debug)]
    pub struct VectorMap<Key: Into<usize>, Value> {
        vector: Vec<Option<Value>>,
        phantom_data: PhantomData<Key>,
    }

    impl<Key: Into<usize>, Value> Default for VectorMap<Key, Value> {
        fn default() -> Self {
            VectorMap {
                vector: vec![],
                phantom_data: PhantomData,
            }
        }
    }

    impl<Key: Into<usize>, Value> VectorMap<Key, Value> {
        pub fn get_or_insert_with(&mut self, key: Key, default: impl FnOnce() -> Value) -> &mut Value {
            let index: usize = key.into();
            if index >= self.vector.len() {
                self.vector.resize_with(index + 1, || None);
            }
            self.vector[index].get_or_insert_with(default)
        }

        /// Iterates populated slots as `(index, value)`.
        pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
            self.vector
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        use test_log::test;

        #[test]
        fn test_get_or_insert_with() {
            let mut map: VectorMap<usize, Vec<u32>> = VectorMap::default();
            assert_eq!(map.iter().count(), 0);
            map.get_or_insert_with(2, Vec::new).push(1);
            map.get_or_insert_with(2, Vec::new).push(2);
            map.get_or_insert_with(5, Vec::new).push(3);
            assert_eq!(
                map.iter().collect::<Vec<_>>(),
                vec![(2, &vec![1, 2]), (5, &vec![3])]
            );
        }
    }
}
