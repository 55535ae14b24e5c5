use rand::Rng;

/// Fisher-Yates shuffle, in place.
///
/// Walks the index down from the last element to 1, swapping each position
/// with a uniformly drawn position in `[0, i]`. Every permutation is equally
/// likely as long as `rng` is uniform. Slices of length 0 or 1 are untouched.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
