use hashbrown::HashMap;

/// Secondary key to the ids carrying it, in insertion order.
pub type VecIndex<K> = HashMap<K, Vec<i64>>;

/// Unique secondary key to a single id.
pub type UniqueIndex = HashMap<String, i64>;

pub(crate) fn remove_from_vec_index(v: &mut Vec<i64>, id: i64) {
    if let Some(pos) = v.iter().position(|x| *x == id) {
        v.remove(pos);
    }
}
