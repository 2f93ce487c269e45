use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use traces::{BeforeFirst, Error, SeriesConfig, TimeSeries};

fn random_pairs(rng: &mut StdRng, count: usize) -> Vec<(i64, u8)> {
    (0..count)
        .map(|_| (rng.random_range(0..1_000), rng.random_range(0..3)))
        .collect()
}

#[test]
fn compaction_is_idempotent_and_preserves_values() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..25 {
        let mut ts = TimeSeries::new(0_u8);
        ts.set_many(random_pairs(&mut rng, 200)).expect("set_many");

        let compacted = ts.compacted();
        assert_eq!(compacted.compacted(), compacted);
        assert!(compacted.len() <= ts.len());
        for t in (-5..1_005).step_by(7) {
            assert_eq!(ts.get(t).expect("get"), compacted.get(t).expect("get"));
        }
        assert!(compacted
            .iterintervals()
            .all(|((_, a), (_, b))| a != b));
    }
}

#[test]
fn insertion_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut pairs = random_pairs(&mut rng, 300);
    pairs.sort_by_key(|(time, _)| *time);
    pairs.dedup_by_key(|(time, _)| *time);

    let mut ordered = TimeSeries::new(0_u8);
    for (time, value) in &pairs {
        ordered.set(*time, *value).expect("set");
    }

    pairs.shuffle(&mut rng);
    let mut shuffled = TimeSeries::new(0_u8);
    for (time, value) in &pairs {
        shuffled.set(*time, *value).expect("set");
    }
    let mut bulk = TimeSeries::new(0_u8);
    bulk.set_many(pairs.iter().copied()).expect("set_many");

    assert_eq!(ordered, shuffled);
    assert_eq!(ordered, bulk);
}

#[test]
fn set_interval_restores_following_value() -> anyhow::Result<()> {
    let mut ts = TimeSeries::new(0);
    ts.set_many(vec![(12_i64, 1), (30, 0), (60, 2)])?;
    ts.set_interval(20, 40, 5, false)?;

    assert_eq!(*ts.get(19)?, 1);
    assert_eq!(*ts.get(20)?, 5);
    assert_eq!(*ts.get(39)?, 5);
    assert_eq!(*ts.get(40)?, 0);
    assert_eq!(*ts.get(60)?, 2);
    assert!(!ts.contains(30));
    Ok(())
}

#[test]
fn before_first_policies() -> anyhow::Result<()> {
    let mut strict = TimeSeries::with_policy(BeforeFirst::Error);
    strict.set(10_i64, "on")?;
    assert!(matches!(strict.get(5), Err(Error::UndefinedValue { .. })));

    let mut first = TimeSeries::with_policy(BeforeFirst::FirstValue);
    first.set(10_i64, "on")?;
    assert_eq!(*first.get(5)?, "on");

    let defaulted = TimeSeries::<i64, &str>::new("off");
    assert_eq!(*defaulted.get(5)?, "off");
    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn series_from_json_config() -> anyhow::Result<()> {
    let config: SeriesConfig<i64, String> = serde_json::from_str(
        r#"{"before_first": {"policy": "Default", "value": "unknown"}, "domain": [[0, 10], [20, 30]]}"#,
    )?;
    let mut ts = TimeSeries::from_config(config)?;
    ts.set(5, "open".to_string())?;
    assert!(ts.set(15, "closed".to_string()).is_err());
    assert_eq!(ts.get(0)?, "unknown");
    assert_eq!(ts.get(25)?, "open");
    Ok(())
}

#[test]
fn invalid_domain_config_is_rejected() {
    let config = SeriesConfig::<i64, i32>::new(BeforeFirst::Default(0)).with_domain(vec![(0, 10), (10, 20)]);
    assert!(matches!(
        TimeSeries::from_config(config),
        Err(Error::InvalidDomain(_))
    ));
}
