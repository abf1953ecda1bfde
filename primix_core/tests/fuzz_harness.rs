use primix_core::{
    DigitEncoding, FixedWidthInt, MillerRabin, PrimixError, SecureState, is_prime_trial,
    secure::PrimeRange,
};
use rand::Rng;

#[test]
#[ignore]
fn fuzz_miller_rabin_against_trial_division() {
    let oracle = MillerRabin::new(20).expect("oracle");
    let mut rng = rand::thread_rng();
    for _ in 0..200_000 {
        let n = rng.gen_range(0..50_000_000u64);
        assert_eq!(oracle.test(n), is_prime_trial(n), "disagreement at {n}");
    }
}

#[test]
#[ignore]
fn fuzz_prime_search_stays_in_range() {
    let oracle = MillerRabin::new(20).expect("oracle");
    let mut rng = rand::thread_rng();
    for _ in 0..64 {
        let lower = rng.gen_range(2..1_000_000u64);
        let upper = lower + rng.gen_range(1..10_000u64);
        let range = PrimeRange::new(lower, upper).expect("range");
        let mut state = SecureState::new();
        state.counter = rng.r#gen();
        match state.find_prime(range, oracle, 4096) {
            Ok(p) => {
                assert!((lower..=upper).contains(&p), "{p} outside [{lower}, {upper}]");
                assert!(is_prime_trial(p));
            }
            Err(PrimixError::PrimeSearchExhausted { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
#[ignore]
fn fuzz_fixed_width_divmod() {
    let mut rng = rand::thread_rng();
    for _ in 0..10_000 {
        let digits: String = (0..rng.gen_range(1..40))
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        let value = FixedWidthInt::parse(&digits, DigitEncoding::Decimal).expect("parse");
        let factor = rng.gen_range(1..u32::MAX as u64);
        let divisor = rng.gen_range(1..u64::MAX);
        let product = value.mul_scalar(factor).expect("mul");
        let (q, r) = product.div_scalar(factor).expect("div");
        assert_eq!(q, value);
        assert_eq!(r, 0);
        let (_, r) = value.div_scalar(divisor).expect("div");
        assert!(r < divisor);
    }
}
