use once_cell::sync::Lazy;
use primix_core::{
    DiffusionCore, DigitEncoding, FastEngine, FixedWidthInt, PrimeWidth, RotationTable,
    SecureParams, SecureState, constants::PI_DIGITS, secure_preset,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;

static VECTOR_CASES: Lazy<Vec<VectorCase>> = Lazy::new(|| {
    vec![
        VectorCase::new("rotation_table", vector_rotation_table),
        VectorCase::new("diffusion_core", vector_diffusion_core),
        VectorCase::new("fixed_width_blend", vector_fixed_width_blend),
        VectorCase::new("fast_stream", vector_fast_stream),
        VectorCase::new("secure_toy_stream", vector_secure_toy_stream),
        VectorCase::new("secure_legacy_stream", vector_secure_legacy_stream),
        VectorCase::new("secure_standard_stream", vector_secure_standard_stream),
    ]
});

struct VectorCase {
    name: &'static str,
    generator: fn() -> Value,
}

impl VectorCase {
    const fn new(name: &'static str, generator: fn() -> Value) -> Self {
        Self { name, generator }
    }

    fn path(&self) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("vectors")
            .join(format!("{}.json", self.name))
    }
}

#[test]
fn golden_vectors_match() {
    let update = env::var("PRIMIX_UPDATE_VECTORS").map_or(false, |v| v == "1");
    for case in VECTOR_CASES.iter() {
        let actual = (case.generator)();
        let path = case.path();
        if update {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, serde_json::to_string_pretty(&actual).unwrap()).unwrap();
        }
        let expected = fs::read_to_string(&path).unwrap_or_else(|_| {
            panic!(
                "Missing golden vector '{}'. Run with PRIMIX_UPDATE_VECTORS=1 cargo test golden_vectors -- --nocapture to generate.",
                case.name
            )
        });
        let expected_value: Value = serde_json::from_str(&expected).unwrap();
        if expected_value != actual {
            panic!(
                "Golden vector '{}' drifted. Expected: {}\nActual: {}",
                case.name, expected_value, actual
            );
        }
    }
}

// Outputs of the legacy generator; not regenerated with the vector files.
const LEGACY_FAST_OUTPUTS: [u64; 8] = [
    0x93ec_2a8d_806c_725d,
    0x0896_c459_3992_8cc5,
    0x4b1a_08f1_ec41_5264,
    0x5e73_2d3b_6866_cb3e,
    0x8dd4_b1a3_a0ee_a7ea,
    0xefe4_8d58_cc84_b8be,
    0x1ab8_4962_fad7_ccd0,
    0x4f46_1f17_7756_7785,
];
const LEGACY_SECURE_TOY_OUTPUTS: [u64; 3] = [
    0x23bf_322c_0e98_92dc,
    0x37e5_c14d_9350_0042,
    0x4b9f_ad7b_f272_fe19,
];

#[test]
fn fast_stream_matches_legacy_generator() {
    let mut engine = FastEngine::new();
    let outputs: Vec<u64> = (0..8).map(|_| engine.next_u64()).collect();
    assert_eq!(outputs, LEGACY_FAST_OUTPUTS);
}

#[test]
fn legacy_secure_stream_matches_legacy_generator() {
    let params = secure_preset(PrimeWidth::Toy).with_encoding(DigitEncoding::LegacyNibble);
    let mut state = SecureState::new();
    let outputs: Vec<u64> = (0..3).map(|_| state.next(&params).unwrap()).collect();
    assert_eq!(outputs, LEGACY_SECURE_TOY_OUTPUTS);
}

fn word_hex(word: u64) -> String {
    format!("{word:#018x}")
}

fn vector_rotation_table() -> Value {
    let table = RotationTable::search();
    json!({
        "description": "Rotation primes of the fast engine",
        "amounts": table.amounts(),
    })
}

fn vector_diffusion_core() -> Value {
    let secure = DiffusionCore::secure();
    let fast = DiffusionCore::fast(RotationTable::search());
    json!({
        "description": "Both diffusion schedules on fixed lanes",
        "secure_mix_1_2_3_4": word_hex(secure.mix_quad([1, 2, 3, 4])),
        "fast_mix_5_6": word_hex(fast.mix_pair(5, 6)),
    })
}

fn vector_fixed_width_blend() -> Value {
    let p1 = 1_000_003;
    let p2 = 1_999_993;
    let pi = FixedWidthInt::parse(PI_DIGITS, DigitEncoding::Decimal).unwrap();
    let (quotient, remainder) = pi.mul_scalar(p1).unwrap().div_scalar(p2).unwrap();
    json!({
        "description": "pi digits times p1 divided by p2",
        "p1": p1,
        "p2": p2,
        "quotient_words": quotient.words().iter().copied().map(word_hex).collect::<Vec<_>>(),
        "used_words": quotient.used_words(),
        "remainder": remainder,
    })
}

fn vector_fast_stream() -> Value {
    let mut engine = FastEngine::new();
    let outputs: Vec<_> = (0..8).map(|_| word_hex(engine.next_u64())).collect();
    json!({
        "description": "First eight fast engine outputs",
        "outputs": outputs,
        "state_after": engine.state().iter().copied().map(word_hex).collect::<Vec<_>>(),
    })
}

fn secure_stream(params: &SecureParams, count: usize, label: &str) -> Value {
    let mut state = SecureState::new();
    let outputs: Vec<_> = (0..count)
        .map(|_| word_hex(state.next(params).unwrap()))
        .collect();
    json!({
        "description": label,
        "prime_lower": params.prime_lower,
        "prime_upper": params.prime_upper,
        "rounds": params.rounds,
        "outputs": outputs,
        "counter": state.counter,
        "timestamp": state.timestamp,
    })
}

fn vector_secure_toy_stream() -> Value {
    secure_stream(
        &secure_preset(PrimeWidth::Toy),
        3,
        "Secure engine, toy primes, decimal digits",
    )
}

fn vector_secure_legacy_stream() -> Value {
    let params = secure_preset(PrimeWidth::Toy).with_encoding(DigitEncoding::LegacyNibble);
    secure_stream(&params, 3, "Secure engine, toy primes, legacy nibble digits")
}

fn vector_secure_standard_stream() -> Value {
    secure_stream(
        &SecureParams::default(),
        2,
        "Secure engine, 63-bit primes, decimal digits",
    )
}
