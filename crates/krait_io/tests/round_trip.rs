use krait_io::{Input, Output};
use proptest::prelude::*;

proptest! {
    #[test]
    fn var_u32_round_trips(value: u32) {
        let mut out = Output::new();
        out.write_var_u32(value);
        let mut input = Input::new(out.into_bytes());
        prop_assert_eq!(input.read_var_u32().unwrap(), value);
        prop_assert!(input.is_empty());
    }

    #[test]
    fn var_u64_round_trips(value: u64) {
        let mut out = Output::new();
        out.write_var_u64(value);
        let mut input = Input::new(out.into_bytes());
        prop_assert_eq!(input.read_var_u64().unwrap(), value);
        prop_assert!(input.is_empty());
    }

    #[test]
    fn var_i32_round_trips_in_both_modes(value: i32, optimize_positive: bool) {
        let mut out = Output::new();
        out.write_var_i32(value, optimize_positive);
        let mut input = Input::new(out.into_bytes());
        prop_assert_eq!(input.read_var_i32(optimize_positive).unwrap(), value);
    }

    #[test]
    fn var_i64_round_trips_in_both_modes(value: i64, optimize_positive: bool) {
        let mut out = Output::new();
        out.write_var_i64(value, optimize_positive);
        let mut input = Input::new(out.into_bytes());
        prop_assert_eq!(input.read_var_i64(optimize_positive).unwrap(), value);
    }

    #[test]
    fn mixed_sequences_stay_aligned(
        a: u8,
        b: i32,
        c: i64,
        d in "\\PC*",
        e: f64,
        flag: bool,
    ) {
        let mut out = Output::new();
        out.write_u8(a);
        out.write_var_i32(b, false);
        out.write_i64(c);
        out.write_str(&d).unwrap();
        out.write_f64(e);
        out.write_bool(flag);

        let mut input = Input::new(out.into_bytes());
        prop_assert_eq!(input.read_u8().unwrap(), a);
        prop_assert_eq!(input.read_var_i32(false).unwrap(), b);
        prop_assert_eq!(input.read_i64().unwrap(), c);
        prop_assert_eq!(input.read_str().unwrap(), d);
        prop_assert_eq!(input.read_f64().unwrap(), e);
        prop_assert_eq!(input.read_bool().unwrap(), flag);
        prop_assert!(input.is_empty());
    }
}
