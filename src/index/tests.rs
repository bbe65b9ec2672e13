use super::lexical::lexical_score;
use super::mock::MockSearchIndex;
use super::*;

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        doc_id: "doc".to_string(),
        source_path: "docs/a.txt".to_string(),
        text: text.to_string(),
        page_start: 1,
        page_end: 1,
        char_start: 0,
        char_end: text.chars().count(),
    }
}

fn hit(id: &str) -> SearchHit {
    SearchHit {
        chunk_id: id.to_string(),
        doc_id: "doc".to_string(),
        source_path: "docs/a.txt".to_string(),
        page: 1,
        char_start: 0,
        char_end: 0,
        text: String::new(),
        score: 0.0,
    }
}

#[test]
fn fuse_scores_blends_normalized_signals() {
    let fused = fuse_scores(&[1.0, 0.0], &[0.0, 1.0], 1.0);
    assert_eq!(fused, vec![1.0, 0.0]);

    let fused = fuse_scores(&[1.0, 0.0], &[0.0, 1.0], 0.0);
    assert_eq!(fused, vec![0.0, 1.0]);

    let fused = fuse_scores(&[1.0, 0.0], &[0.0, 1.0], 0.5);
    assert!((fused[0] - 0.5).abs() < 1e-6);
    assert!((fused[1] - 0.5).abs() < 1e-6);
}

#[test]
fn fuse_scores_min_max_normalizes_each_leg() {
    let fused = fuse_scores(&[3.0, 1.0, 2.0], &[0.0, 0.0, 0.0], 1.0);
    assert!((fused[0] - 1.0).abs() < 1e-6);
    assert!(fused[1].abs() < 1e-6);
    assert!((fused[2] - 0.5).abs() < 1e-6);
}

#[test]
fn constant_scores_stay_neutral() {
    // A backend exposing only one signal must not dominate the blend.
    let fused = fuse_scores(&[0.7, 0.7, 0.7], &[0.0, 1.0, 0.5], 0.5);
    assert!(fused[1] > fused[2] && fused[2] > fused[0]);
}

#[test]
fn rank_hits_sorts_and_truncates() {
    let hits = vec![hit("a"), hit("b"), hit("c")];
    let ranked = rank_hits(hits, vec![0.2, 0.9, 0.5], 2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].chunk_id, "b");
    assert_eq!(ranked[1].chunk_id, "c");
    assert!((ranked[0].score - 0.9).abs() < 1e-6);
}

#[test]
fn lexical_score_counts_query_coverage() {
    assert!((lexical_score("access review", "the access review completed") - 1.0).abs() < 1e-6);
    assert!(lexical_score("access review", "unrelated text entirely").abs() < 1e-6);

    // Stopwords never count as content tokens.
    assert!((lexical_score("the of and", "anything")).abs() < 1e-6);
    assert!(
        (lexical_score("Retention POLICY", "retention policy, reviewed.") - 1.0).abs() < 1e-6
    );

    let half = lexical_score("retention policy", "the policy was updated");
    assert!((half - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn mock_index_requires_collection() {
    let index = MockSearchIndex::new(3);
    let err = index
        .upsert_chunks(&[chunk("a:0000", "text")], &[vec![1.0, 0.0, 0.0]])
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::CollectionNotFound { .. }));
}

#[tokio::test]
async fn mock_index_rejects_wrong_dimension() {
    let index = MockSearchIndex::new(3);
    index.ensure_collection().await.unwrap();
    let err = index
        .upsert_chunks(&[chunk("a:0000", "text")], &[vec![1.0, 0.0]])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IndexError::InvalidDimension {
            expected: 3,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn mock_index_ranks_by_dense_similarity() {
    let index = MockSearchIndex::new(3);
    index.ensure_collection().await.unwrap();
    index
        .upsert_chunks(
            &[
                chunk("d:0000", "alpha"),
                chunk("d:0001", "beta"),
                chunk("d:0002", "gamma"),
            ],
            &[
                vec![1.0, 0.0, 0.0],
                vec![0.8, 0.6, 0.0],
                vec![0.0, 1.0, 0.0],
            ],
        )
        .await
        .unwrap();
    assert_eq!(index.point_count(), 3);

    let hits = index
        .hybrid_search("unmatched query", &[1.0, 0.0, 0.0], 1.0, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk_id, "d:0000");
    assert_eq!(hits[1].chunk_id, "d:0001");
    assert_eq!(hits[2].chunk_id, "d:0002");

    let top = index
        .hybrid_search("unmatched query", &[1.0, 0.0, 0.0], 1.0, 1)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].chunk_id, "d:0000");
}

#[tokio::test]
async fn mock_index_lexical_leg_promotes_matching_text() {
    let index = MockSearchIndex::new(2);
    index.ensure_collection().await.unwrap();
    index
        .upsert_chunks(
            &[
                chunk("d:0000", "vendor contracts were renewed"),
                chunk("d:0001", "backup restoration was tested successfully"),
            ],
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .await
        .unwrap();

    // Dense favors the first chunk; pure-lexical search must favor the second.
    let hits = index
        .hybrid_search("backup restoration tested", &[1.0, 0.0], 0.0, 10)
        .await
        .unwrap();
    assert_eq!(hits[0].chunk_id, "d:0001");
}

#[tokio::test]
async fn mock_index_upsert_replaces_by_chunk_id() {
    let index = MockSearchIndex::new(2);
    index.ensure_collection().await.unwrap();
    index
        .upsert_chunks(&[chunk("d:0000", "first")], &[vec![1.0, 0.0]])
        .await
        .unwrap();
    index
        .upsert_chunks(&[chunk("d:0000", "second")], &[vec![0.0, 1.0]])
        .await
        .unwrap();
    assert_eq!(index.point_count(), 1);

    let hits = index
        .hybrid_search("q", &[0.0, 1.0], 1.0, 10)
        .await
        .unwrap();
    assert_eq!(hits[0].text, "second");
}
