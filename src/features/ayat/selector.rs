use rand::Rng;

/// 从集合中等概率取出一个元素；空集合返回 None。
pub fn pick_one<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..items.len());
    Some(items.swap_remove(idx))
}
