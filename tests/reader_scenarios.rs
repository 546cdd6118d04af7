//! End-to-end behaviour of the reader engine.
//!
//! # What this covers
//!
//! - An empty reader runs a cycle without notifying anyone.
//! - New articles are delivered once; an identical re-fetch is silent.
//! - Edited entries are refreshed in place without a second notification.
//! - The combined delta follows registry order across sources and
//!   chronological order within each source.
//! - One failing feed does not block delivery from healthy feeds.
//! - A failing subscriber does not block later subscribers.
//! - Read markers keep only the latest timestamp.

mod common;

use std::sync::Arc;

use common::*;
use feedwatch::{Article, FnSubscriber, Reader, ReaderError, Source};

#[tokio::test]
async fn empty_reader_then_first_source() {
    let fetcher = ScriptedFetcher::new();
    let recorder = Recorder::new();
    let reader = Reader::create(vec![], fetcher.clone()).unwrap();
    reader.subscribe(recorder.clone()).await.unwrap();

    let report = reader.update_all().await.unwrap();
    assert!(report.new_items.is_empty());
    assert!(recorder.deliveries().is_empty());

    reader.add_source(Source::new("A", "http://a")).await.unwrap();
    fetcher.serve("A", vec![entry("a1", "Hello", 1)]);

    let report = reader.update_all().await.unwrap();
    assert_eq!(report.new_items.len(), 1);
    assert_eq!(report.new_items[0].uri, "a1");
    assert_eq!(recorder.deliveries(), vec![vec!["a1".to_string()]]);

    let report = reader.update_all().await.unwrap();
    assert!(report.new_items.is_empty());
    assert_eq!(recorder.deliveries().len(), 1, "re-fetch must not notify");
}

#[tokio::test]
async fn edited_entry_is_refreshed_silently() {
    let fetcher = ScriptedFetcher::new();
    let recorder = Recorder::new();
    let reader = Reader::create(vec![Source::new("A", "http://a")], fetcher.clone()).unwrap();
    reader.subscribe(recorder.clone()).await.unwrap();

    fetcher.serve("A", vec![entry("a1", "Hello", 1)]);
    reader.update_all().await.unwrap();

    fetcher.serve("A", vec![entry("a1", "Hello (updated)", 1)]);
    let report = reader.update_all().await.unwrap();

    assert!(report.new_items.is_empty());
    assert_eq!(recorder.deliveries().len(), 1);
    let articles = reader.articles().await;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Hello (updated)");
}

#[tokio::test]
async fn delta_follows_registry_then_chronological_order() {
    let fetcher = ScriptedFetcher::new();
    let recorder = Recorder::new();
    let reader = Reader::create(
        vec![Source::new("B", "http://b"), Source::new("A", "http://a")],
        fetcher.clone(),
    )
    .unwrap();
    reader.subscribe(recorder.clone()).await.unwrap();

    fetcher.serve("A", vec![entry("a3", "T3", 3), entry("a1", "T1", 1)]);
    fetcher.serve("B", vec![entry("b2", "T2", 2)]);

    reader.update_all().await.unwrap();

    assert_eq!(
        recorder.deliveries(),
        vec![vec!["b2".to_string(), "a1".to_string(), "a3".to_string()]]
    );
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn failing_feed_does_not_block_healthy_feed() {
    let fetcher = ScriptedFetcher::new();
    let recorder = Recorder::new();
    let reader = Reader::create(
        vec![Source::new("A", "http://a"), Source::new("B", "http://b")],
        fetcher.clone(),
    )
    .unwrap();
    reader.subscribe(recorder.clone()).await.unwrap();

    fetcher.fail("A");
    fetcher.serve("B", vec![entry("b1", "One", 1), entry("b2", "Two", 2)]);

    let report = reader.update_all().await.unwrap();

    assert_eq!(report.fetch_failures.len(), 1);
    assert_eq!(report.fetch_failures[0].source, "A");
    assert!(!report.is_clean());
    assert_eq!(
        recorder.deliveries(),
        vec![vec!["b1".to_string(), "b2".to_string()]]
    );
}

#[tokio::test]
async fn failing_subscriber_is_reported_and_isolated() {
    let fetcher = ScriptedFetcher::new();
    let recorder = Recorder::new();
    let reader = Reader::create(vec![Source::new("A", "http://a")], fetcher.clone()).unwrap();
    reader
        .subscribe(Arc::new(FnSubscriber::new("broken", |_: &[Article]| {
            anyhow::bail!("window closed")
        })))
        .await
        .unwrap();
    reader.subscribe(recorder.clone()).await.unwrap();

    fetcher.serve("A", vec![entry("a1", "Hello", 1)]);
    let report = reader.update_all().await.unwrap();

    assert_eq!(report.delivery_failures.len(), 1);
    assert_eq!(report.delivery_failures[0].subscriber, "broken");
    assert_eq!(recorder.deliveries().len(), 1);
    assert_eq!(reader.articles().await.len(), 1);
}

#[tokio::test]
async fn read_marker_keeps_latest_timestamp() {
    let fetcher = ScriptedFetcher::new();
    let reader = Reader::create(vec![Source::new("A", "http://a")], fetcher.clone()).unwrap();
    fetcher.serve("A", vec![entry("a1", "Hello", 1)]);
    let report = reader.update_all().await.unwrap();
    let article = &report.new_items[0];

    reader.read_item(article, at(2)).await.unwrap();
    reader.read_item(article, at(7)).await.unwrap();

    assert!(reader.is_read("a1").await);
    assert_eq!(reader.read_at("a1").await, Some(at(7)));
    assert!(reader.unread().await.is_empty());
}

#[tokio::test]
async fn lookups_on_unknown_identities() {
    let fetcher = ScriptedFetcher::new();
    let reader = Reader::create(vec![Source::new("A", "http://a")], fetcher.clone()).unwrap();
    fetcher.serve("A", vec![entry("a1", "Hello", 1)]);
    let report = reader.update_all().await.unwrap();

    assert_eq!(reader.try_find_source("never-merged").await.unwrap(), None);
    assert_eq!(
        reader.try_find_source("a1").await.unwrap().map(|s| s.name),
        Some("A".to_string())
    );

    let mut forged = report.new_items[0].clone();
    forged.uri = "forged".to_string();
    assert_eq!(
        reader.read_item(&forged, at(3)).await,
        Err(ReaderError::UnknownArticle("forged".to_string()))
    );
    assert!(!reader.is_read("a1").await);
}

#[tokio::test]
async fn duplicate_add_is_rejected_without_change() {
    let reader =
        Reader::create(vec![Source::new("A", "http://a")], ScriptedFetcher::new()).unwrap();

    let err = reader.add_source(Source::new("A2", "http://a")).await.unwrap_err();

    assert!(matches!(err, ReaderError::DuplicateSource { .. }));
    assert_eq!(reader.sources().await, vec![Source::new("A", "http://a")]);
}
