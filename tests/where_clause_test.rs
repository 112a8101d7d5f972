use calla::{
    DataValue, DocumentId, EnumArrayPredicate, EnumPredicate, GeoPoint, GeoPredicate,
    IndexDirectory, InsertOptions, InternalId, NumberPredicate, PolygonPredicate, Predicate,
    RadiusPredicate, Schema, SearchableType, StandardAnalyzer, WhereClause,
};

fn insert(
    dir: &mut IndexDirectory,
    analyzer: &StandardAnalyzer,
    property: &str,
    id: InternalId,
    value: DataValue,
) {
    dir.insert(
        property,
        &DocumentId::Number(id),
        id,
        &value,
        None,
        analyzer,
        8,
        &InsertOptions::default(),
    )
    .unwrap();
}

fn geo_fixture() -> (IndexDirectory, StandardAnalyzer) {
    let schema = Schema::builder()
        .field("loc", SearchableType::GeoPoint)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    let points = [
        (1u64, 45.0, 9.0),
        (2, 45.001, 9.001),
        (3, 46.0, 10.0),
    ];
    for (id, lat, lon) in points {
        let point = GeoPoint::new(lat, lon).unwrap();
        insert(&mut dir, &analyzer, "loc", id, DataValue::Geo(point));
    }
    (dir, analyzer)
}

fn radius(meters: f64, inside: bool) -> Predicate {
    Predicate::Geo(GeoPredicate::Radius(RadiusPredicate {
        coordinates: GeoPoint { lat: 45.0, lon: 9.0 },
        value: meters,
        unit: "m".to_string(),
        inside,
        high_precision: false,
    }))
}

#[test]
fn test_geo_radius_scenario() {
    // Distances from (45, 9): doc 1 at 0 m, doc 2 at ~140 m, doc 3 far.
    let (dir, analyzer) = geo_fixture();
    let clause = WhereClause::new().filter("loc", radius(200.0, true));
    let mut hits = dir.search_by_where_clause(&clause, &analyzer, None).unwrap();
    hits.sort_unstable();
    assert_eq!(hits, vec![1, 2]);
}

#[test]
fn test_geo_radius_outside_and_high_precision() {
    let (dir, analyzer) = geo_fixture();

    let clause = WhereClause::new().filter("loc", radius(200.0, false));
    assert_eq!(
        dir.search_by_where_clause(&clause, &analyzer, None).unwrap(),
        vec![3]
    );

    let precise = Predicate::Geo(GeoPredicate::Radius(RadiusPredicate {
        coordinates: GeoPoint { lat: 45.0, lon: 9.0 },
        value: 0.2,
        unit: "km".to_string(),
        inside: true,
        high_precision: true,
    }));
    let clause = WhereClause::new().filter("loc", precise);
    let mut hits = dir.search_by_where_clause(&clause, &analyzer, None).unwrap();
    hits.sort_unstable();
    assert_eq!(hits, vec![1, 2]);
}

#[test]
fn test_geo_unknown_unit_is_rejected() {
    let (dir, analyzer) = geo_fixture();
    let bad = Predicate::Geo(GeoPredicate::Radius(RadiusPredicate {
        coordinates: GeoPoint { lat: 45.0, lon: 9.0 },
        value: 1.0,
        unit: "furlong".to_string(),
        inside: true,
        high_precision: false,
    }));
    let clause = WhereClause::new().filter("loc", bad);
    let err = dir.search_by_where_clause(&clause, &analyzer, None).unwrap_err();
    assert_eq!(err.tag(), "INVALID_FILTER_OPERATION");
}

#[test]
fn test_geo_polygon() {
    let (dir, analyzer) = geo_fixture();
    // A box around (45, 9) and (45.001, 9.001) but not (46, 10).
    let polygon = |inside| {
        Predicate::Geo(GeoPredicate::Polygon(PolygonPredicate {
            coordinates: vec![
                GeoPoint { lat: 44.9, lon: 8.9 },
                GeoPoint { lat: 44.9, lon: 9.1 },
                GeoPoint { lat: 45.1, lon: 9.1 },
                GeoPoint { lat: 45.1, lon: 8.9 },
            ],
            inside,
            high_precision: false,
        }))
    };

    let clause = WhereClause::new().filter("loc", polygon(true));
    let mut hits = dir.search_by_where_clause(&clause, &analyzer, None).unwrap();
    hits.sort_unstable();
    assert_eq!(hits, vec![1, 2]);

    let clause = WhereClause::new().filter("loc", polygon(false));
    assert_eq!(
        dir.search_by_where_clause(&clause, &analyzer, None).unwrap(),
        vec![3]
    );
}

#[test]
fn test_degenerate_polygon_matches_nothing() {
    let (dir, analyzer) = geo_fixture();
    let degenerate = Predicate::Geo(GeoPredicate::Polygon(PolygonPredicate {
        coordinates: vec![
            GeoPoint { lat: 44.9, lon: 8.9 },
            GeoPoint { lat: 45.1, lon: 9.1 },
        ],
        inside: true,
        high_precision: false,
    }));
    let clause = WhereClause::new().filter("loc", degenerate);
    assert!(dir
        .search_by_where_clause(&clause, &analyzer, None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_text_filter_unions_tokens() {
    let schema = Schema::builder()
        .field("title", SearchableType::String)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    insert(&mut dir, &analyzer, "title", 1, "red cat".into());
    insert(&mut dir, &analyzer, "title", 2, "blue dog".into());
    insert(&mut dir, &analyzer, "title", 3, "green bird".into());

    let clause = WhereClause::new().filter("title", Predicate::Text("red dog".to_string()));
    assert_eq!(
        dir.search_by_where_clause(&clause, &analyzer, None).unwrap(),
        vec![1, 2]
    );

    let clause = WhereClause::new().filter(
        "title",
        Predicate::TextList(vec!["bird".to_string(), "cat".to_string()]),
    );
    assert_eq!(
        dir.search_by_where_clause(&clause, &analyzer, None).unwrap(),
        vec![3, 1]
    );
}

#[test]
fn test_enum_array_contains_all() {
    let schema = Schema::builder()
        .field("tags", SearchableType::EnumArray)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    insert(
        &mut dir,
        &analyzer,
        "tags",
        1,
        DataValue::EnumList(vec!["new".to_string(), "sale".to_string()]),
    );
    insert(&mut dir, &analyzer, "tags", 2, DataValue::EnumList(vec!["new".to_string()]));

    let clause = WhereClause::new().filter(
        "tags",
        Predicate::EnumArray(EnumArrayPredicate::ContainsAll(vec![
            "new".into(),
            "sale".into(),
        ])),
    );
    assert_eq!(
        dir.search_by_where_clause(&clause, &analyzer, None).unwrap(),
        vec![1]
    );

    // Scalar operators are rejected on array properties.
    let clause = WhereClause::new().filter(
        "tags",
        Predicate::Enum(EnumPredicate::Eq("new".into())),
    );
    let err = dir.search_by_where_clause(&clause, &analyzer, None).unwrap_err();
    assert_eq!(err.tag(), "INVALID_FILTER_OPERATION");
}

#[test]
fn test_intersection_is_order_independent() {
    let schema = Schema::builder()
        .field("age", SearchableType::Number)
        .field("color", SearchableType::Enum)
        .field("active", SearchableType::Boolean)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    let rows: &[(InternalId, f64, &str, bool)] = &[
        (1, 10.0, "red", true),
        (2, 25.0, "red", true),
        (3, 30.0, "red", false),
        (4, 35.0, "blue", true),
    ];
    for (id, age, color, active) in rows {
        insert(&mut dir, &analyzer, "age", *id, DataValue::Number(*age));
        insert(&mut dir, &analyzer, "color", *id, DataValue::Enum((*color).to_string()));
        insert(&mut dir, &analyzer, "active", *id, DataValue::Bool(*active));
    }

    let p_age = Predicate::Number(NumberPredicate::Gte(20.0));
    let p_color = Predicate::Enum(EnumPredicate::Eq("red".into()));
    let p_active = Predicate::Bool(true);

    let forward = WhereClause::new()
        .filter("age", p_age.clone())
        .filter("color", p_color.clone())
        .filter("active", p_active.clone());
    let backward = WhereClause::new()
        .filter("active", p_active)
        .filter("color", p_color)
        .filter("age", p_age);

    let mut a = dir.search_by_where_clause(&forward, &analyzer, None).unwrap();
    let mut b = dir.search_by_where_clause(&backward, &analyzer, None).unwrap();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, vec![2]);
    assert_eq!(a, b);
}
