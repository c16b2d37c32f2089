use super::*;

#[test]
fn test_cosine_identical_and_opposite() {
    let v = [0.3f32, -1.2, 4.0, 0.5];
    let neg: Vec<f32> = v.iter().map(|x| -x).collect();

    assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&v, &neg).unwrap() + 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_orthogonal() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
}

#[test]
fn test_cosine_zero_vector_is_exactly_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]).unwrap(), 0.0);
    assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
}

#[test]
fn test_cosine_dimension_mismatch() {
    let err = cosine_similarity(&[1.0; 768], &[1.0; 1536]).unwrap_err();
    assert_eq!(
        err,
        RankingError::DimensionMismatch {
            expected: 768,
            actual: 1536
        }
    );
}

#[test]
fn test_find_most_similar_basic_ranking() {
    let query = vec![1.0, 0.0, 0.0];
    let passages = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
    let texts = ["A", "B"];

    let results = find_most_similar(&query, &passages, &texts, 2).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "A");
    assert_eq!(results[0].similarity, 1.0);
    assert_eq!(results[0].original_index, 0);
    assert_eq!(results[1].text, "B");
    assert_eq!(results[1].similarity, 0.0);
    assert_eq!(results[1].original_index, 1);
}

#[test]
fn test_find_most_similar_truncates_to_top_k() {
    let query = vec![1.0, 1.0];
    let passages: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, i as f32]).collect();
    let texts: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();

    let results = find_most_similar(&query, &passages, &texts, 3).unwrap();
    assert_eq!(results.len(), 3);
    assert!(
        results
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity)
    );

    let all = find_most_similar(&query, &passages, &texts, 50).unwrap();
    assert_eq!(all.len(), 10);
}

#[test]
fn test_find_most_similar_ties_keep_input_order() {
    let query = vec![1.0, 0.0];
    let passages = vec![vec![0.0, 1.0], vec![2.0, 0.0], vec![1.0, 0.0], vec![0.0, 3.0]];
    let texts = ["w", "x", "y", "z"];

    let results = find_most_similar(&query, &passages, &texts, 4).unwrap();
    let order: Vec<usize> = results.iter().map(|r| r.original_index).collect();
    assert_eq!(order, vec![1, 2, 0, 3]);
}

#[test]
fn test_find_most_similar_empty_and_zero_k() {
    let query = vec![1.0, 0.0];
    let results = find_most_similar::<&str>(&query, &[], &[], 5).unwrap();
    assert!(results.is_empty());

    let results = find_most_similar(&query, &[vec![1.0, 0.0]], &["a"], 0).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_find_most_similar_rejects_mismatched_lengths() {
    let err = find_most_similar(&[1.0], &[vec![1.0]], &["a", "b"], 5).unwrap_err();
    assert!(matches!(err, RankingError::MalformedInput { .. }));
}

#[test]
fn test_find_most_similar_rejects_mixed_dimensions() {
    let err = find_most_similar(&[1.0, 0.0], &[vec![1.0, 0.0], vec![1.0]], &["a", "b"], 5)
        .unwrap_err();
    assert!(matches!(
        err,
        RankingError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[test]
fn test_nan_sorts_last() {
    let query = vec![1.0, 0.0];
    let passages = vec![vec![f32::NAN, 0.0], vec![0.5, 0.5]];
    let results = find_most_similar(&query, &passages, &["nan", "ok"], 2).unwrap();
    assert_eq!(results[0].text, "ok");
    assert!(results[1].similarity.is_nan());
}

#[test]
fn test_similarity_ranker_defaults() {
    let ranker = SimilarityRanker::default();
    assert_eq!(ranker.top_k(), DEFAULT_TOP_K);

    let passages: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32 + 1.0, 1.0]).collect();
    let texts: Vec<String> = (0..8).map(|i| i.to_string()).collect();
    let results = ranker.rank(&[1.0, 0.0], &passages, &texts).unwrap();
    assert_eq!(results.len(), DEFAULT_TOP_K);
    assert_eq!(results[0].original_index, 7);
}

#[test]
fn test_result_serializes_camel_case() {
    let result = SimilarityResult {
        text: "a".into(),
        similarity: 0.5,
        original_index: 3,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["originalIndex"], 3);
}
