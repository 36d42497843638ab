// Batch orchestration: ordering, skipping, caption handling, failure behaviour

mod common;

use common::*;
use post_analyser::error::AnalysisError;
use post_analyser::models::*;
use post_analyser::stream::{Chunk, StreamingAggregator};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

struct Output {
    body: String,
    stream_error: Option<AnalysisError>,
    result: Result<post_analyser::orchestrator::BatchSummary, AnalysisError>,
}

async fn run_batch(h: &Harness, posts: Vec<RawPost>) -> Output {
    let (tx, mut rx) = mpsc::channel::<Chunk>(64);
    let aggregator = StreamingAggregator::open(tx).await.unwrap();
    let result = h.orchestrator.run_to_end(&posts, aggregator).await;
    let mut body = String::new();
    let mut stream_error = None;
    while let Some(chunk) = rx.recv().await {
        match chunk {
            Ok(b) => body.push_str(std::str::from_utf8(&b).unwrap()),
            Err(e) => stream_error = Some(e),
        }
    }
    Output {
        body,
        stream_error,
        result,
    }
}

#[tokio::test]
async fn image_posts_are_emitted_in_input_order() {
    let h = default_harness();
    let posts: Vec<RawPost> = (1..=5).map(|i| image_post(i, i * 10)).collect();
    let out = run_batch(&h, posts).await;

    let parsed: Vec<AnalysisResult> = serde_json::from_str(&out.body).unwrap();
    let ids: Vec<PostId> = parsed.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, (1..=5).map(PostId::Int).collect::<Vec<_>>());
    let summary = out.result.unwrap();
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.emitted, 5);
}

#[tokio::test]
async fn empty_batch_is_empty_array() {
    let h = default_harness();
    let out = run_batch(&h, vec![]).await;
    assert_eq!(out.body, "[]");
}

#[tokio::test]
async fn non_image_posts_are_counted_but_not_emitted() {
    let h = default_harness();
    let out = run_batch(&h, vec![text_post(2, 5), text_post(3, 6)]).await;
    assert_eq!(out.body, "[]");
    let summary = out.result.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(h.vision.call_count(), 0);
    assert!(h.media.fetched.lock().unwrap().is_empty());
    assert!(h.language.texts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mixed_batch_keeps_relative_order_of_images() {
    let h = default_harness();
    let posts = vec![
        text_post(1, 1),
        image_post(2, 2),
        text_post(3, 3),
        image_post(4, 4),
    ];
    let out = run_batch(&h, posts).await;
    let parsed: Vec<AnalysisResult> = serde_json::from_str(&out.body).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].id, PostId::Int(2));
    assert_eq!(parsed[1].id, PostId::Int(4));
    assert_eq!(h.stats.posts_processed_total.load(Ordering::Relaxed), 4);
    assert_eq!(h.stats.results_emitted_total.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn single_post_without_detections_matches_expected_json() {
    let h = default_harness();
    let mut post = image_post(1, 1000);
    post.media = Some("http://x/img.png".into());
    let out = run_batch(&h, vec![post]).await;
    assert_eq!(
        out.body,
        r#"[{"id":1,"timestamp":1000000,"faces":[],"labels":[],"logos":[]}]"#
    );
    assert_eq!(h.media.fetched.lock().unwrap().as_slice(), ["http://x/img.png"]);
}

#[tokio::test]
async fn caption_sentiment_present_only_with_text() {
    let h = default_harness();
    let mut with_text = image_post(1, 1);
    with_text.text = Some("great day".into());
    let mut empty_text = image_post(2, 2);
    empty_text.text = Some(String::new());
    let without_text = image_post(3, 3);

    let out = run_batch(&h, vec![with_text, empty_text, without_text]).await;
    let values: Vec<serde_json::Value> = serde_json::from_str(&out.body).unwrap();
    assert_eq!(
        values[0]["caption_sentiment"],
        serde_json::json!({"score": 0.8, "magnitude": 1.2})
    );
    assert!(values[1].get("caption_sentiment").is_none());
    assert!(values[2].get("caption_sentiment").is_none());
    assert!(out.body.contains(r#""caption_sentiment":{"score":0.8,"magnitude":1.2}"#));
    assert_eq!(h.language.texts.lock().unwrap().as_slice(), ["great day"]);
}

#[tokio::test]
async fn annotations_are_normalized() {
    let annotations = ImageAnnotations {
        faces: vec![
            FaceAnnotation {
                joy: Likelihood::VeryLikely,
                anger: Likelihood::VeryUnlikely,
                sorrow: Likelihood::Unlikely,
                surprise: Likelihood::Possible,
            },
            FaceAnnotation::default(),
        ],
        labels: vec![EntityAnnotation::new("beach"), EntityAnnotation::new("sky")],
        logos: vec![EntityAnnotation::new("Acme")],
        landmarks: vec![EntityAnnotation::new("Pier")],
    };
    let h = harness(
        StubMedia::default(),
        StubVision::scripted(vec![Ok(annotations)]),
        StubLanguage::default(),
    );
    let out = run_batch(&h, vec![image_post(7, 3)]).await;
    let values: Vec<serde_json::Value> = serde_json::from_str(&out.body).unwrap();
    let r = &values[0];
    assert_eq!(r["timestamp"], 3000);
    assert_eq!(
        r["faces"][0],
        serde_json::json!({"joy":"VERY_LIKELY","anger":"VERY_UNLIKELY","sorrow":"UNLIKELY","surprise":"POSSIBLE"})
    );
    assert_eq!(r["faces"][1]["joy"], "UNKNOWN");
    assert_eq!(r["labels"], serde_json::json!(["beach", "sky"]));
    assert_eq!(r["logos"], serde_json::json!(["Acme"]));
    assert!(r.get("landmarks").is_none());
}

#[tokio::test]
async fn fixed_feature_set_is_requested() {
    let h = default_harness();
    run_batch(&h, vec![image_post(1, 1)]).await;
    let calls = h.vision.calls.lock().unwrap();
    let kinds: Vec<FeatureKind> = calls[0].1.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FeatureKind::LabelDetection,
            FeatureKind::FaceDetection,
            FeatureKind::LogoDetection,
            FeatureKind::LandmarkDetection,
        ]
    );
    assert!(calls[0].1.iter().all(|f| f.max_results == 10));
}

#[tokio::test]
async fn media_failure_aborts_batch_without_closing_array() {
    let media = StubMedia {
        failing: ["http://x/2.png".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let h = harness(media, StubVision::default(), StubLanguage::default());
    let out = run_batch(&h, vec![image_post(1, 1), image_post(2, 2), image_post(3, 3)]).await;

    assert!(matches!(out.result, Err(AnalysisError::Transport { .. })));
    assert!(out.stream_error.is_some());
    assert!(out.body.starts_with("[{\"id\":1"));
    assert!(!out.body.ends_with(']'));
    // Not retried, and nothing after the failing post is touched.
    assert_eq!(h.media.fetched.lock().unwrap().len(), 2);
    assert_eq!(h.vision.call_count(), 1);
    assert_eq!(h.stats.failed_batches_total.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn non_rate_limit_annotation_error_is_not_retried() {
    let h = harness(
        StubMedia::default(),
        StubVision::scripted(vec![Err(AnalysisError::transport("vision", "HTTP 500"))]),
        StubLanguage::default(),
    );
    let out = run_batch(&h, vec![image_post(1, 1)]).await;
    assert!(matches!(out.result, Err(AnalysisError::Transport { .. })));
    assert_eq!(h.vision.call_count(), 1);
    assert_eq!(out.body, "[");
}

#[tokio::test]
async fn sentiment_failure_is_fatal() {
    let language = StubLanguage {
        fail: true,
        ..Default::default()
    };
    let h = harness(StubMedia::default(), StubVision::default(), language);
    let mut post = image_post(1, 1);
    post.text = Some("hello".into());
    let out = run_batch(&h, vec![post, image_post(2, 2)]).await;
    assert!(out.result.is_err());
    assert_eq!(h.language.texts.lock().unwrap().len(), 1);
    assert_eq!(h.media.fetched.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_post_is_retried_then_emitted() {
    let h = harness(
        StubMedia::default(),
        StubVision::scripted(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Ok(ImageAnnotations::default()),
        ]),
        StubLanguage::default(),
    );
    let out = run_batch(&h, vec![image_post(1, 1), image_post(2, 2)]).await;
    let parsed: Vec<AnalysisResult> = serde_json::from_str(&out.body).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(h.vision.call_count(), 4);
    // Media is fetched once per post, not once per annotation attempt.
    assert_eq!(h.media.fetched.lock().unwrap().len(), 2);
    assert_eq!(h.stats.rate_limited_total.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn spawn_stream_produces_full_array() {
    use futures_util::StreamExt;

    let h = default_harness();
    let stream = h
        .orchestrator
        .clone()
        .spawn_stream(vec![image_post(1, 1), text_post(2, 2), image_post(3, 3)]);
    let chunks: Vec<Chunk> = stream.collect().await;
    let body: String = chunks
        .into_iter()
        .map(|c| String::from_utf8(c.unwrap().to_vec()).unwrap())
        .collect();
    let parsed: Vec<AnalysisResult> = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(h.stats.batches_total.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn spawn_stream_surfaces_failure_as_stream_error() {
    use futures_util::StreamExt;

    let media = StubMedia {
        failing: ["http://x/1.png".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let h = harness(media, StubVision::default(), StubLanguage::default());
    let chunks: Vec<Chunk> = h
        .orchestrator
        .clone()
        .spawn_stream(vec![image_post(1, 1)])
        .collect()
        .await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(&chunks[0].as_ref().unwrap()[..], b"[");
    assert!(chunks[1].is_err());
}
