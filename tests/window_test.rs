use pretty_assertions::assert_eq;
use prism_stream::checkpoint::{decode, encode};
use prism_stream::{
    create_aggregator, AggregateKind, ColumnRefExpression, LengthWindow, LogicalType,
    PrismStreamError, PrismStreamResult, SnapshotFormat, Value, WindowSnapshot,
};

fn window(length: usize) -> PrismStreamResult<LengthWindow> {
    // Events are (symbol, price)
    let price = ColumnRefExpression::new(1, "price", LogicalType::Integer).into_ref();
    let aggregators = [AggregateKind::Sum, AggregateKind::Stddev, AggregateKind::Min]
        .iter()
        .map(|kind| create_aggregator(*kind, &[price.clone()]))
        .collect::<PrismStreamResult<Vec<_>>>()?;
    LengthWindow::new(length, price, aggregators)
}

fn event(price: i32) -> Vec<Value> {
    vec![Value::varchar("WSO2"), Value::integer(price)]
}

#[test]
fn test_length_window_retracts_expired_events() -> PrismStreamResult<()> {
    let mut window = window(3)?;
    let mut results = Vec::new();
    for price in [10, 20, 30, 40, 50] {
        results.push(window.process(&event(price))?);
    }

    let sums: Vec<Value> = results.iter().map(|r| r[0].clone()).collect();
    assert_eq!(
        sums,
        vec![
            Value::bigint(10),
            Value::bigint(30),
            Value::bigint(60),
            Value::bigint(90),
            Value::bigint(120),
        ]
    );
    let mins: Vec<Value> = results.iter().map(|r| r[2].clone()).collect();
    assert_eq!(mins[4], Value::bigint(30));

    // stddev of {30, 40, 50}
    let Value::Double(stddev) = results[4][1] else {
        panic!("expected DOUBLE stddev");
    };
    assert!((stddev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_window_checkpoint_resumes_identically() -> PrismStreamResult<()> {
    for format in [SnapshotFormat::Json, SnapshotFormat::Binary] {
        let mut original = window(2)?;
        for price in [7, 3, 9] {
            original.process(&event(price))?;
        }
        let bytes = encode(&original.snapshot(), format)?;

        let mut resumed = window(2)?;
        let snapshot: WindowSnapshot = decode(&bytes, format)?;
        resumed.restore(&snapshot)?;
        assert_eq!(resumed.len(), 2);
        assert_eq!(resumed.length(), 2);

        for price in [1, 12, 12] {
            assert_eq!(resumed.process(&event(price))?, original.process(&event(price))?);
        }
    }
    Ok(())
}

#[test]
fn test_window_restore_rejects_mismatched_shape() -> PrismStreamResult<()> {
    let mut small = window(1)?;
    let mut large = window(3)?;
    for price in [1, 2, 3] {
        large.process(&event(price))?;
    }

    let err = small.restore(&large.snapshot()).unwrap_err();
    assert!(matches!(err, PrismStreamError::MalformedState(_)));
    assert!(small.is_empty());

    let mut snapshot = large.snapshot();
    snapshot.aggregators.pop();
    let err = large.restore(&snapshot).unwrap_err();
    assert!(matches!(err, PrismStreamError::MalformedState(_)));
    Ok(())
}

#[test]
fn test_failed_restore_rolls_back_aggregators() -> PrismStreamResult<()> {
    let mut window = window(4)?;
    window.process(&event(5))?;
    let before = window.snapshot();

    let mut other = self::window(4)?;
    other.process(&event(8))?;
    let mut snapshot = other.snapshot();
    // Swap in a state of another layout for the last aggregator
    snapshot.aggregators[2] = snapshot.aggregators[0].clone();

    let err = window.restore(&snapshot).unwrap_err();
    assert!(matches!(err, PrismStreamError::MalformedState(_)));
    assert_eq!(window.snapshot(), before);
    Ok(())
}

#[test]
fn test_missing_column_is_rejected() -> PrismStreamResult<()> {
    let mut window = window(2)?;
    let err = window.process(&[Value::varchar("WSO2")]).unwrap_err();
    assert!(matches!(err, PrismStreamError::InvalidArgument(_)));
    assert!(window.is_empty());
    Ok(())
}

#[test]
fn test_window_checkpoint_keeps_infinite_values() -> PrismStreamResult<()> {
    let reading = ColumnRefExpression::new(0, "reading", LogicalType::Double).into_ref();
    let build = || -> PrismStreamResult<LengthWindow> {
        let aggregators = [AggregateKind::Sum, AggregateKind::Max]
            .iter()
            .map(|kind| create_aggregator(*kind, &[reading.clone()]))
            .collect::<PrismStreamResult<Vec<_>>>()?;
        LengthWindow::new(2, reading.clone(), aggregators)
    };

    let mut original = build()?;
    original.process(&[Value::double(1.0)])?;
    original.process(&[Value::double(f64::INFINITY)])?;
    let bytes = encode(&original.snapshot(), SnapshotFormat::Json)?;

    let mut resumed = build()?;
    let snapshot: WindowSnapshot = decode(&bytes, SnapshotFormat::Json)?;
    resumed.restore(&snapshot)?;
    assert_eq!(resumed.snapshot(), original.snapshot());

    let next = [Value::double(2.0)];
    let results = resumed.process(&next)?;
    assert_eq!(results, original.process(&next)?);
    assert_eq!(results[1], Value::double(f64::INFINITY));
    Ok(())
}
