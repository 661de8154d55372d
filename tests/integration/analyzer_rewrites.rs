//! End-to-end rewrites driven through the analyzer: aggregation output
//! substitution, inline view rebasing and window clause merging.

use std::io::Write;

use expr_subst::query::{AnalyzerError, InMemoryMetadata};
use expr_subst::{
    Analyzer, BinaryOp, DataType, Expr, SlotId, SmapConfig, SmapError, SmapResult,
    SubstitutionMap,
};

fn catalog() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_column("orders", "id", SlotId(0), DataType::BigInt)
        .with_column("orders", "amount", SlotId(1), DataType::Int)
        .with_column("orders", "region", SlotId(2), DataType::Varchar)
        .with_column("customers", "id", SlotId(3), DataType::BigInt)
        .with_column("customers", "name", SlotId(4), DataType::Varchar)
        // Aggregation output tuple.
        .with_column("agg", "cnt", SlotId(10), DataType::BigInt)
        .with_column("agg", "total", SlotId(11), DataType::BigInt)
        // Inline view `v` over orders.
        .with_column("v", "oid", SlotId(20), DataType::BigInt)
        .with_column("v", "amt", SlotId(21), DataType::Int)
}

#[test]
fn aggregate_outputs_replace_aggregate_calls() -> SmapResult<()> {
    let metadata = catalog();
    let analyzer = Analyzer::new(&metadata);

    let count = analyzer.analyze(&Expr::count_star())?;
    let total = analyzer.analyze(&Expr::function(
        "sum",
        vec![Expr::qualified("orders", "amount")],
    ))?;
    let mut agg_smap = SubstitutionMap::new();
    agg_smap.put(count, analyzer.analyze(&Expr::qualified("agg", "cnt"))?)?;
    agg_smap.put(total, analyzer.analyze(&Expr::qualified("agg", "total"))?)?;

    let select = analyzer.analyze(&Expr::binary(
        BinaryOp::Add,
        Expr::function("zeroifnull", vec![Expr::count_star()]),
        Expr::function("SUM", vec![Expr::qualified("orders", "amount")]),
    ))?;
    assert_eq!(select.ty(), Some(DataType::BigInt));

    let rewritten = select.try_substitute(&agg_smap)?;
    assert_eq!(rewritten.to_sql(), "(zeroifnull(agg.cnt) + agg.total)");
    assert!(rewritten.is_analyzed());
    Ok(())
}

#[test]
fn having_rewrite_composes_with_aggregate_outputs() -> SmapResult<()> {
    let metadata = catalog();
    let analyzer = Analyzer::new(&metadata);

    // Outer-join nullability wraps count(*) before the aggregation output
    // substitution is known.
    let count = analyzer.analyze(&Expr::count_star())?;
    let wrapped = analyzer.analyze(&Expr::function("zeroifnull", vec![Expr::count_star()]))?;
    let mut nullable = SubstitutionMap::new();
    nullable.put(count.clone(), wrapped)?;

    let mut outputs = SubstitutionMap::new();
    outputs.put(count.clone(), analyzer.analyze(&Expr::qualified("agg", "cnt"))?)?;

    let composed = SubstitutionMap::compose(Some(&nullable), Some(&outputs))?;
    assert_eq!(composed.len(), 1);

    let having = analyzer.analyze(&Expr::binary(
        BinaryOp::Gt,
        Expr::count_star(),
        Expr::literal(5),
    ))?;
    let rewritten = having.try_substitute(&composed)?;
    assert_eq!(rewritten.to_sql(), "(zeroifnull(agg.cnt) > 5)");
    Ok(())
}

#[test]
fn inline_view_rebasing_records_slot_equivalences() -> SmapResult<()> {
    let metadata = catalog();
    let mut analyzer = Analyzer::new(&metadata);

    // Outer references to orders were first renamed onto the view.
    let mut view_smap = SubstitutionMap::new();
    view_smap.put(
        analyzer.analyze(&Expr::qualified("orders", "id"))?,
        analyzer.analyze(&Expr::qualified("v", "oid"))?,
    )?;
    // The join condition maps the same outer column onto customers.
    let mut join_smap = SubstitutionMap::new();
    join_smap.put(
        analyzer.analyze(&Expr::qualified("orders", "id"))?,
        analyzer.analyze(&Expr::qualified("customers", "id"))?,
    )?;
    join_smap.put(
        analyzer.analyze(&Expr::qualified("orders", "region"))?,
        Expr::literal("EMEA"),
    )?;

    let rebased = SubstitutionMap::subtraction(Some(&view_smap), Some(&join_smap), &mut analyzer)?;
    let pairs: Vec<(String, String)> = rebased
        .iter()
        .map(|(lhs, rhs)| (lhs.to_sql(), rhs.to_sql()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("v.oid".to_owned(), "customers.id".to_owned()),
            ("orders.region".to_owned(), "'EMEA'".to_owned()),
        ]
    );

    let classes = analyzer.equivalences();
    assert!(classes.are_equivalent(SlotId(3), SlotId(20)));
    assert_eq!(classes.class_of(SlotId(20)), vec![SlotId(3), SlotId(20)]);
    assert!(!classes.are_equivalent(SlotId(2), SlotId(3)));
    Ok(())
}

#[test]
fn view_expressions_are_rewritten_through_nested_mappings() -> SmapResult<()> {
    let metadata = catalog();
    let analyzer = Analyzer::new(&metadata);

    // v.amt is defined as abs(orders.amount) inside the view.
    let mut view_def = SubstitutionMap::new();
    view_def.put(
        analyzer.analyze(&Expr::qualified("v", "amt"))?,
        analyzer.analyze(&Expr::function(
            "abs",
            vec![Expr::qualified("orders", "amount")],
        ))?,
    )?;
    // A later pass materializes orders.amount into the view's own slot.
    let mut materialize = SubstitutionMap::new();
    materialize.put(
        analyzer.analyze(&Expr::qualified("orders", "amount"))?,
        analyzer.analyze(&Expr::qualified("v", "amt"))?,
    )?;
    materialize.put(
        analyzer.analyze(&Expr::qualified("orders", "id"))?,
        analyzer.analyze(&Expr::qualified("v", "oid"))?,
    )?;

    let merged = SubstitutionMap::compose_and_replace(Some(&view_def), Some(&materialize))?;
    let pairs: Vec<(String, String)> = merged
        .iter()
        .map(|(lhs, rhs)| (lhs.to_sql(), rhs.to_sql()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("v.amt".to_owned(), "abs(v.amt)".to_owned()),
            ("orders.id".to_owned(), "v.oid".to_owned()),
        ]
    );
    Ok(())
}

#[test]
fn window_partition_and_order_keys_may_collide() -> SmapResult<()> {
    let metadata = catalog();
    let analyzer = Analyzer::new(&metadata);
    let config = SmapConfig::from_toml_str("[substitution]\nverify = true\n")?;

    let region = analyzer.analyze(&Expr::qualified("orders", "region"))?;
    let mut partition_by = SubstitutionMap::with_options(config.options());
    let upper = Expr::function("upper", vec![Expr::qualified("orders", "region")]);
    partition_by.put(region.clone(), analyzer.analyze(&upper)?)?;
    let mut order_by = SubstitutionMap::with_options(config.options());
    let lower = Expr::function("lower", vec![Expr::qualified("orders", "region")]);
    order_by.put(region.clone(), analyzer.analyze(&lower)?)?;

    let merged = SubstitutionMap::combine(Some(&partition_by), Some(&order_by))?;
    assert_eq!(merged.duplicate_lhs(), vec![(0, 1)]);
    assert_eq!(
        merged.get(&region).map(Expr::to_sql).as_deref(),
        Some("upper(orders.region)")
    );
    Ok(())
}

#[test]
fn analyzer_failures_convert_into_smap_errors() {
    let metadata = catalog();
    let analyzer = Analyzer::new(&metadata);

    let resolve = |expr: Expr| -> SmapResult<Expr> { Ok(analyzer.analyze(&expr)?) };

    let err = resolve(Expr::column("id")).unwrap_err();
    assert_eq!(err.code(), "AmbiguousColumn");
    let err = resolve(Expr::qualified("orders", "missing")).unwrap_err();
    assert!(matches!(
        err,
        SmapError::Analyzer(AnalyzerError::UnknownColumn { .. })
    ));
    let err = resolve(Expr::function("sum", vec![Expr::star()])).unwrap_err();
    assert_eq!(err.code(), "StarNotAllowed");
    let err = resolve(Expr::function(
        "sum",
        vec![Expr::qualified("customers", "name")],
    ))
    .unwrap_err();
    assert_eq!(err.code(), "TypeMismatch");
}

#[test]
fn config_file_controls_strictness() -> SmapResult<()> {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[substitution]\ncheck_analyzed = false").expect("write config");
    let config = SmapConfig::load(file.path())?;
    assert_eq!(config.path(), Some(file.path()));

    let mut relaxed = SubstitutionMap::with_options(config.options());
    relaxed.put(Expr::column("id"), Expr::column("oid"))?;
    assert_eq!(relaxed.len(), 1);

    // Algebra results are strict again even when an input was not.
    let strict = SubstitutionMap::new();
    let composed = SubstitutionMap::compose(Some(&strict), Some(&relaxed));
    if cfg!(feature = "verify-smap") {
        assert!(composed.unwrap_err().is_internal());
    } else {
        let composed = composed?;
        assert!(composed.options().check_analyzed);
        assert_eq!(composed.len(), 1);
    }
    Ok(())
}
