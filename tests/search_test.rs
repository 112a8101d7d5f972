use calla::{
    DataValue, DocumentId, IndexDirectory, InsertOptions, InternalId, Schema, SearchParams,
    SearchableType, StandardAnalyzer,
};

fn directory(titles: &[(InternalId, &str)]) -> IndexDirectory {
    let schema = Schema::builder()
        .field("title", SearchableType::String)
        .field("body", SearchableType::String)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    for (id, title) in titles {
        dir.insert(
            "title",
            &DocumentId::Number(*id),
            *id,
            &DataValue::from(*title),
            None,
            &analyzer,
            titles.len(),
            &InsertOptions::default(),
        )
        .unwrap();
    }
    dir
}

fn ids(results: &[(InternalId, f32)]) -> Vec<InternalId> {
    results.iter().map(|(id, _)| *id).collect()
}

#[test]
fn test_exact_vs_fuzzy_scenario() {
    // "hello world" and "help"; term "helo" with tolerance 1 finds both,
    // with exact matching finds neither.
    let dir = directory(&[(1, "hello world"), (2, "help")]);
    let analyzer = StandardAnalyzer::new();

    let fuzzy = SearchParams::builder()
        .term("helo")
        .properties(["title"])
        .tolerance(1)
        .build();
    let results = dir.search(&fuzzy, &analyzer, None).unwrap();
    assert_eq!(ids(&results), vec![1, 2]);
    assert!(results.iter().all(|(_, score)| *score > 0.0));

    let exact = SearchParams::builder()
        .term("helo")
        .properties(["title"])
        .exact(true)
        .build();
    assert!(dir.search(&exact, &analyzer, None).unwrap().is_empty());
}

#[test]
fn test_tolerance_zero_differs_from_nonzero() {
    let dir = directory(&[(1, "hello")]);
    let analyzer = StandardAnalyzer::new();

    let tol0 = SearchParams::builder()
        .term("hallo")
        .properties(["title"])
        .tolerance(0)
        .build();
    assert!(dir.search(&tol0, &analyzer, None).unwrap().is_empty());

    let tol1 = SearchParams::builder()
        .term("hallo")
        .properties(["title"])
        .tolerance(1)
        .build();
    assert_eq!(ids(&dir.search(&tol1, &analyzer, None).unwrap()), vec![1]);
}

#[test]
fn test_empty_term_returns_all_docs_per_property() {
    let dir = directory(&[(1, "alpha"), (2, "beta"), (3, "gamma")]);
    let analyzer = StandardAnalyzer::new();
    let params = SearchParams::builder()
        .term("")
        .properties(["title"])
        .build();
    let results = dir.search(&params, &analyzer, None).unwrap();
    assert_eq!(ids(&results), vec![1, 2, 3]);
}

#[test]
fn test_search_monotonicity_under_inserts() {
    // Adding a document containing the query tokens never lowers the
    // score of documents already indexed.
    let analyzer = StandardAnalyzer::new();
    let before = directory(&[(1, "rust search engine"), (2, "search index")]);
    let after = directory(&[
        (1, "rust search engine"),
        (2, "search index"),
        (3, "search search search"),
    ]);

    let params = SearchParams::builder()
        .term("search")
        .properties(["title"])
        .build();
    let scores_before = before.search(&params, &analyzer, None).unwrap();
    let scores_after = after.search(&params, &analyzer, None).unwrap();

    for (id, score) in &scores_before {
        let later = scores_after
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, s)| *s)
            .unwrap();
        assert!(
            later >= *score,
            "doc {} score dropped from {} to {}",
            id,
            score,
            later
        );
    }
}

#[test]
fn test_multi_property_search_accumulates() {
    let schema = Schema::builder()
        .field("title", SearchableType::String)
        .field("body", SearchableType::String)
        .build();
    let mut dir = IndexDirectory::create(&schema).unwrap();
    let analyzer = StandardAnalyzer::new();
    let opts = InsertOptions::default();

    dir.insert(
        "title",
        &DocumentId::Number(1),
        1,
        &"winter garden".into(),
        None,
        &analyzer,
        2,
        &opts,
    )
    .unwrap();
    dir.insert(
        "body",
        &DocumentId::Number(1),
        1,
        &"the garden rests in winter".into(),
        None,
        &analyzer,
        2,
        &opts,
    )
    .unwrap();
    dir.insert(
        "body",
        &DocumentId::Number(2),
        2,
        &"a garden of stones".into(),
        None,
        &analyzer,
        2,
        &opts,
    )
    .unwrap();

    let both = SearchParams::builder()
        .term("garden")
        .properties(["title", "body"])
        .build();
    let results = dir.search(&both, &analyzer, None).unwrap();
    assert_eq!(ids(&results), vec![1, 2]);

    // Doc 1 scores from both properties; doc 2 from one.
    let title_boosted = SearchParams::builder()
        .term("garden")
        .properties(["title", "body"])
        .boost("title", 5.0)
        .build();
    let boosted = dir.search(&title_boosted, &analyzer, None).unwrap();
    let score = |rs: &[(InternalId, f32)], id| {
        rs.iter().find(|(i, _)| *i == id).map(|(_, s)| *s).unwrap()
    };
    let gain_1 = score(&boosted, 1) - score(&results, 1);
    let gain_2 = score(&boosted, 2) - score(&results, 2);
    assert!(gain_1 > 0.0);
    assert_eq!(gain_2, 0.0);
}

#[test]
fn test_results_keep_accumulation_order_not_score_order() {
    // Scores are never sorted by the core; order is first contribution.
    let dir = directory(&[(1, "ember"), (2, "ember ember ember")]);
    let analyzer = StandardAnalyzer::new();
    let params = SearchParams::builder()
        .term("ember")
        .properties(["title"])
        .build();
    let results = dir.search(&params, &analyzer, None).unwrap();
    assert_eq!(ids(&results), vec![1, 2]);
    // Doc 2 scores higher but still comes second.
    assert!(results[1].1 > results[0].1);
}
