use chrono::NaiveDate;
use proptest::prelude::*;
use wavedag::delay::Delay;

fn delay_strategy() -> impl Strategy<Value = Delay> {
    (-3..=3i32, -14..=14i32, -400..=400i32).prop_map(|(y, m, d)| Delay::new(y, m, d))
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1990..2090i32, 1..=12u32, 1..=28u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    #[test]
    fn test_delay_sum_is_associative(
        a in delay_strategy(),
        b in delay_strategy(),
        c in delay_strategy(),
        base in date_strategy(),
    ) {
        let left = a.add(&b).add(&c);
        let right = a.add(&b.add(&c));
        prop_assert_eq!(left.apply_to(base), right.apply_to(base));
    }

    #[test]
    fn test_sum_applies_steps_in_order(
        a in delay_strategy(),
        b in delay_strategy(),
        base in date_strategy(),
    ) {
        prop_assert_eq!(a.add(&b).apply_to(base), b.apply_to(a.apply_to(base)));
    }

    #[test]
    fn test_day_delays_add_like_integers(
        x in -1000..1000i32,
        y in -1000..1000i32,
        base in date_strategy(),
    ) {
        let summed = Delay::days(x).add(&Delay::days(y));
        prop_assert_eq!(summed.apply_to(base), Delay::days(x + y).apply_to(base));
    }

    #[test]
    fn test_comparison_is_antisymmetric(a in delay_strategy(), b in delay_strategy()) {
        prop_assert!(!(a.less_than(&b) && b.less_than(&a)));
        prop_assert_eq!(a.less_than(&b), b.greater_than(&a));
    }
}
