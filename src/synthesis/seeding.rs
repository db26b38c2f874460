use rand::{SeedableRng, rngs::StdRng};
use xxhash_rust::xxh3::xxh3_64;

// Stable across platforms and toolchains, unlike `DefaultHasher`.
pub fn file_name_hash(file_name: &str) -> u64 {
    xxh3_64(file_name.as_bytes())
}

// RNG for one document. With a base seed the stream depends only on the seed and
// the file name, never on processing order.
pub fn rng_for_file(seed: Option<u64>, file_name: &str) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ file_name_hash(file_name)),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}
