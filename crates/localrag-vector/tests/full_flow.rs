use std::sync::Arc;
use std::thread;

use localrag_embed::HashEmbedder;
use localrag_vector::VectorIndex;

const CORPUS: &[&str] = &[
    "fire needs fuel heat and oxygen",
    "water boils at one hundred degrees",
    "keep a fire extinguisher near the stove",
    "seeds should be planted after the last frost",
    "store water in a cool dark place",
    "a small fire can be smothered with a lid",
];

fn build(embedder: &HashEmbedder) -> VectorIndex {
    let index = VectorIndex::new();
    for (i, text) in CORPUS.iter().enumerate() {
        index.insert(format!("doc:{i}"), &embedder.embed_sync(text)).expect("insert");
    }
    index
}

#[test]
fn search_is_ranked_and_bounded() {
    let embedder = HashEmbedder::new(256).expect("embedder");
    let index = build(&embedder);
    let q = embedder.embed_sync("how do I put out a fire");

    for k in 0..=CORPUS.len() + 2 {
        let hits = index.search(&q, k).expect("search");
        assert!(hits.len() <= k);
        assert_eq!(hits.len(), k.min(CORPUS.len()));
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score, "scores must not increase");
        }
    }
    let top = index.search(&q, 1).expect("search");
    assert!(["doc:0", "doc:2", "doc:5"].contains(&top[0].id.as_str()));
}

#[test]
fn identical_embeddings_tie_in_insertion_order() {
    let embedder = HashEmbedder::new(256).expect("embedder");
    let index = build(&embedder);
    let v = embedder.embed_sync("solar panels charge batteries");
    index.insert("first", &v).expect("insert");
    index.insert("second", &v).expect("insert");

    let hits = index.search(&v, 2).expect("search");
    assert_eq!(hits[0].id, "first");
    assert_eq!(hits[1].id, "second");
    assert_eq!(hits[0].score, hits[1].score);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
}

#[test]
fn concurrent_readers_never_see_partial_entries() {
    let embedder = HashEmbedder::new(64).expect("embedder");
    let index = Arc::new(VectorIndex::new());
    index.insert("seed", &embedder.embed_sync("seed entry")).expect("insert");
    let query = embedder.embed_sync("entry");

    let writer = {
        let index = Arc::clone(&index);
        let embedder = embedder.clone();
        thread::spawn(move || {
            for i in 0..200 {
                let vector = embedder.embed_sync(&format!("entry {i}"));
                index.insert(format!("w:{i}"), &vector).expect("insert");
                if i % 3 == 0 {
                    index.remove(&format!("w:{i}"));
                }
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let query = query.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let hits = index.search(&query, 10).expect("search");
                    assert!(!hits.is_empty());
                    for h in &hits {
                        assert!(h.score.is_finite());
                    }
                }
            })
        })
        .collect();

    writer.join().expect("writer");
    for r in readers {
        r.join().expect("reader");
    }
    assert_eq!(index.len(), 1 + 200 - 67);
}
