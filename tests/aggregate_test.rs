use pretty_assertions::assert_eq;
use prism_stream::{
    create_aggregator, AggregateKind, AggregatorRef, ColumnRefExpression, ConstantExpression,
    LogicalType, PrismStreamError, PrismStreamResult, Value,
};

fn aggregator(kind: AggregateKind, input_type: LogicalType) -> PrismStreamResult<AggregatorRef> {
    let input = ColumnRefExpression::new(0, "price", input_type).into_ref();
    create_aggregator(kind, &[input])
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Double(v) => *v,
        other => panic!("expected DOUBLE result, got {:?}", other),
    }
}

#[test]
fn test_sum_int_scenario() -> PrismStreamResult<()> {
    let mut sum = aggregator(AggregateKind::Sum, LogicalType::Integer)?;
    assert_eq!(sum.return_type(), &LogicalType::BigInt);

    let results = [10, 20, 30]
        .into_iter()
        .map(|v| sum.process_add(&Value::integer(v)))
        .collect::<PrismStreamResult<Vec<_>>>()?;
    assert_eq!(results, vec![Value::bigint(10), Value::bigint(30), Value::bigint(60)]);

    assert_eq!(sum.process_remove(&Value::integer(20))?, Value::bigint(40));
    Ok(())
}

#[test]
fn test_sum_matches_arithmetic_sum() -> PrismStreamResult<()> {
    let values = [1.25, -3.5, 1e6, 0.001, 42.0];
    let mut sum = aggregator(AggregateKind::Sum, LogicalType::Double)?;
    let mut last = Value::Null;
    for v in values {
        last = sum.process_add(&Value::double(v))?;
    }
    let expected: f64 = values.iter().sum();
    assert!((as_f64(&last) - expected).abs() < 1e-9);

    let mut sum = aggregator(AggregateKind::Sum, LogicalType::BigInt)?;
    for v in [i64::MAX / 2, 7, -19] {
        last = sum.process_add(&Value::bigint(v))?;
    }
    assert_eq!(last, Value::bigint(i64::MAX / 2 + 7 - 19));
    Ok(())
}

#[test]
fn test_add_then_remove_returns_zero_state() -> PrismStreamResult<()> {
    let cases = [
        (AggregateKind::Sum, LogicalType::Integer, Value::integer(17)),
        (AggregateKind::Sum, LogicalType::Float, Value::float(2.75)),
        (AggregateKind::Stddev, LogicalType::Double, Value::double(9.5)),
        (AggregateKind::Avg, LogicalType::BigInt, Value::bigint(-4)),
        (AggregateKind::Count, LogicalType::Double, Value::double(1.0)),
        (AggregateKind::Min, LogicalType::Integer, Value::integer(3)),
        (AggregateKind::Max, LogicalType::Float, Value::float(3.5)),
    ];
    for (kind, input_type, value) in cases {
        let mut fresh = aggregator(kind, input_type.clone())?;
        let mut used = aggregator(kind, input_type)?;
        used.process_add(&value)?;
        let result = used.process_remove(&value)?;

        assert_eq!(result, fresh.reset(), "{} result", kind);
        assert_eq!(used.snapshot(), fresh.snapshot(), "{} state", kind);
    }
    Ok(())
}

#[test]
fn test_stddev_fewer_than_two_values() -> PrismStreamResult<()> {
    let mut stddev = aggregator(AggregateKind::Stddev, LogicalType::Integer)?;
    assert_eq!(stddev.process_add(&Value::integer(12))?, Value::double(0.0));
    Ok(())
}

#[test]
fn test_stddev_identical_values() -> PrismStreamResult<()> {
    let mut stddev = aggregator(AggregateKind::Stddev, LogicalType::Double)?;
    let mut last = Value::Null;
    for _ in 0..5 {
        last = stddev.process_add(&Value::double(3.3))?;
    }
    assert!(as_f64(&last).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_stddev_one_to_four() -> PrismStreamResult<()> {
    let mut stddev = aggregator(AggregateKind::Stddev, LogicalType::BigInt)?;
    let mut last = Value::Null;
    for v in 1..=4 {
        last = stddev.process_add(&Value::bigint(v))?;
    }
    assert!((as_f64(&last) - 1.25f64.sqrt()).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_stddev_scenario() -> PrismStreamResult<()> {
    let mut stddev = aggregator(AggregateKind::Stddev, LogicalType::Float)?;
    let mut last = Value::Null;
    for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
        last = stddev.process_add(&Value::float(v))?;
    }
    assert!((as_f64(&last) - 2.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_stddev_remove_to_empty_then_add() -> PrismStreamResult<()> {
    let mut first = aggregator(AggregateKind::Stddev, LogicalType::Double)?;
    first.process_add(&Value::double(6.0))?;

    let mut reused = aggregator(AggregateKind::Stddev, LogicalType::Double)?;
    for v in [1.0, 4.0] {
        reused.process_add(&Value::double(v))?;
    }
    for v in [4.0, 1.0] {
        reused.process_remove(&Value::double(v))?;
    }
    reused.process_add(&Value::double(6.0))?;

    assert_eq!(reused.snapshot(), first.snapshot());
    assert_eq!(
        reused.process_add(&Value::double(8.0))?,
        first.process_add(&Value::double(8.0))?
    );
    Ok(())
}

#[test]
fn test_restore_reproduces_results() -> PrismStreamResult<()> {
    let kinds = [
        AggregateKind::Sum,
        AggregateKind::Stddev,
        AggregateKind::Avg,
        AggregateKind::Count,
        AggregateKind::Min,
        AggregateKind::Max,
    ];
    for kind in kinds {
        let mut original = aggregator(kind, LogicalType::Double)?;
        for v in [3.0, 1.5, 8.25, 1.5] {
            original.process_add(&Value::double(v))?;
        }

        let mut restored = aggregator(kind, LogicalType::Double)?;
        restored.restore(&original.snapshot())?;

        assert_eq!(
            restored.process_remove(&Value::double(1.5))?,
            original.process_remove(&Value::double(1.5))?,
            "{} after remove",
            kind
        );
        assert_eq!(
            restored.process_add(&Value::double(-2.0))?,
            original.process_add(&Value::double(-2.0))?,
            "{} after add",
            kind
        );
    }
    Ok(())
}

#[test]
fn test_init_arity() {
    let input = ColumnRefExpression::new(0, "price", LogicalType::Double).into_ref();
    for kind in [AggregateKind::Sum, AggregateKind::Stddev] {
        let err = create_aggregator(kind, &[]).unwrap_err();
        assert!(matches!(err, PrismStreamError::Configuration(_)));

        let err = create_aggregator(kind, &[input.clone(), input.clone()]).unwrap_err();
        assert!(
            matches!(err, PrismStreamError::Configuration(ref msg) if msg.contains("2 parameters"))
        );
    }
}

#[test]
fn test_init_rejects_non_numeric_input() {
    let declared = [
        LogicalType::Boolean,
        LogicalType::Varchar,
        LogicalType::Object,
        LogicalType::Null,
    ];
    for input_type in declared {
        for kind in [AggregateKind::Sum, AggregateKind::Stddev, AggregateKind::Min] {
            let err = aggregator(kind, input_type.clone()).unwrap_err();
            assert!(matches!(err, PrismStreamError::UnsupportedType(_)), "{} {}", kind, input_type);
        }
    }
}

#[test]
fn test_batch_calls_are_unsupported() -> PrismStreamResult<()> {
    let mut sum = aggregator(AggregateKind::Sum, LogicalType::Integer)?;
    let err = sum.process_add_batch(&[Value::integer(1), Value::integer(2)]).unwrap_err();
    assert!(matches!(err, PrismStreamError::UnsupportedOperation(_)));
    assert_eq!(sum.process_add(&Value::integer(1))?, Value::bigint(1));
    Ok(())
}

#[test]
fn test_avg_count_min_max_under_retraction() -> PrismStreamResult<()> {
    let mut avg = aggregator(AggregateKind::Avg, LogicalType::Integer)?;
    let mut count = aggregator(AggregateKind::Count, LogicalType::Integer)?;
    let mut min = aggregator(AggregateKind::Min, LogicalType::Integer)?;
    let mut max = aggregator(AggregateKind::Max, LogicalType::Integer)?;

    for v in [4, 10, 1, 10] {
        let value = Value::integer(v);
        avg.process_add(&value)?;
        count.process_add(&value)?;
        min.process_add(&value)?;
        max.process_add(&value)?;
    }

    let one = Value::integer(1);
    assert_eq!(avg.process_remove(&one)?, Value::double(8.0));
    assert_eq!(count.process_remove(&one)?, Value::bigint(3));
    assert_eq!(min.process_remove(&one)?, Value::bigint(4));
    assert_eq!(max.process_remove(&Value::integer(10))?, Value::bigint(10));
    assert_eq!(max.process_remove(&Value::integer(10))?, Value::bigint(4));
    Ok(())
}

#[test]
fn test_lifecycle_hooks_have_no_effect() -> PrismStreamResult<()> {
    let input = ConstantExpression::new(Value::bigint(5)).into_ref();
    let mut sum = create_aggregator(AggregateKind::Sum, &[input])?;
    sum.stop();
    sum.start();
    sum.start();
    assert_eq!(sum.process_add(&Value::bigint(5))?, Value::bigint(5));
    sum.stop();
    assert_eq!(sum.process_add(&Value::bigint(5))?, Value::bigint(10));
    Ok(())
}
