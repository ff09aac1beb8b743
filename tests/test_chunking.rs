use closuregen::resolve::{ChunkPartition, ChunkingConfig};
use closuregen::util::constants::BYTES_IN_HEAP_REF;
use closuregen::GenError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEED64: u64 = 0x4050cb1b5ab26c70;
const ROUNDS: usize = 2000;

fn get_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED64)
}

fn random_config(rng: &mut ChaCha8Rng) -> ChunkingConfig {
    let threshold = rng.random_range(1..=8192);
    ChunkingConfig {
        threshold,
        chunk_size: rng.random_range(1..=threshold),
        alignment: BYTES_IN_HEAP_REF << rng.random_range(0..6u32),
    }
}

/// Every index of `0..len` is in exactly one region, and the regions come in order.
fn assert_partition_law(p: &ChunkPartition, len: usize) {
    assert_eq!(p.prefix.start, 0);
    assert_eq!(p.prefix.end, p.chunks.start);
    assert_eq!(p.chunks.end, p.tail.start);
    assert_eq!(p.tail.end, len);
    assert_eq!(p.chunks.len() % p.chunk_size, 0);

    let mut seen = vec![0u8; len];
    for i in p.inline_indices() {
        seen[i] += 1;
    }
    for range in p.chunk_ranges() {
        for i in range {
            seen[i] += 1;
        }
    }
    assert!(seen.iter().all(|&n| n == 1));
}

#[test]
fn random_partitions_cover_the_array_once() {
    let mut rng = get_rng();
    for _ in 0..ROUNDS {
        let config = random_config(&mut rng);
        config.validate().unwrap();
        let len = rng.random_range(0..=3 * config.threshold);
        let base = rng.random_range(0..1usize << 20) * BYTES_IN_HEAP_REF;
        let partition = ChunkPartition::compute(base, len, &config);
        assert_partition_law(&partition, len);
        // Chunks start on an aligned address.
        if partition.is_chunked() {
            assert_eq!((base + partition.chunks.start * BYTES_IN_HEAP_REF) % config.alignment, 0);
        }
    }
}

#[test]
fn short_arrays_are_one_pass() {
    let mut rng = get_rng();
    for _ in 0..ROUNDS {
        let config = random_config(&mut rng);
        let len = rng.random_range(0..=config.threshold);
        let base = rng.random_range(0..1usize << 20) * BYTES_IN_HEAP_REF;
        let partition = ChunkPartition::compute(base, len, &config);
        assert!(!partition.is_chunked());
        assert!(partition.inline_indices().eq(0..len));
    }
}

#[test]
fn long_arrays_leave_less_than_a_chunk_inline_after_the_prefix() {
    let mut rng = get_rng();
    for _ in 0..ROUNDS {
        let config = random_config(&mut rng);
        let len = rng.random_range(config.threshold + 1..=4 * config.threshold);
        let base = rng.random_range(0..1usize << 20) * BYTES_IN_HEAP_REF;
        let partition = ChunkPartition::compute(base, len, &config);
        assert!(partition.tail.len() < config.chunk_size);
        assert!(partition.prefix.len() < config.alignment / BYTES_IN_HEAP_REF);
    }
}

#[test]
fn invalid_configs_are_rejected() {
    let valid = ChunkingConfig::default();
    valid.validate().unwrap();
    let bad = [
        ChunkingConfig {
            threshold: 0,
            ..valid
        },
        ChunkingConfig {
            chunk_size: 0,
            ..valid
        },
        ChunkingConfig {
            chunk_size: valid.threshold + 1,
            ..valid
        },
        ChunkingConfig {
            alignment: 48,
            ..valid
        },
        ChunkingConfig {
            alignment: 4,
            ..valid
        },
    ];
    for config in bad {
        assert!(matches!(config.validate(), Err(GenError::Options { .. })), "{:?}", config);
    }
}
