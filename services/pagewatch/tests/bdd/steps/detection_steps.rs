//! BDD step definitions for change detection feature

use cucumber::{given, then, when};

use pagewatch::detector::{classify, Classification, Fingerprint, KeywordSet};
use pagewatch::fetcher::FetchResult;

use crate::world::PageWatchWorld;

fn classify_in_world(world: &mut PageWatchWorld, fetch: FetchResult) {
    let keywords = world.keywords.clone().unwrap_or_default();
    world.classification = Some(classify(
        world.previous_fingerprint.as_ref(),
        fetch,
        &keywords,
    ));
}

#[given(expr = "the keywords {string}")]
fn keywords(world: &mut PageWatchWorld, keyword_list: String) {
    world.keywords = Some(KeywordSet::new(keyword_list.split(',')));
}

#[given("no keywords")]
fn no_keywords(world: &mut PageWatchWorld) {
    world.keywords = Some(KeywordSet::default());
}

#[given("no previous read")]
fn no_previous_read(world: &mut PageWatchWorld) {
    world.previous_fingerprint = None;
}

#[given(expr = "a previous read of {string}")]
fn previous_read(world: &mut PageWatchWorld, content: String) {
    world.previous_fingerprint = Some(Fingerprint::of(&content));
}

#[when(expr = "the content {string} is classified")]
fn content_classified(world: &mut PageWatchWorld, content: String) {
    classify_in_world(world, FetchResult::Ok(content));
}

#[when("a missing element is classified")]
fn missing_classified(world: &mut PageWatchWorld) {
    classify_in_world(world, FetchResult::NotFound);
}

#[when(expr = "a transport error {string} is classified")]
fn transport_error_classified(world: &mut PageWatchWorld, detail: String) {
    classify_in_world(world, FetchResult::TransportError(detail));
}

#[then(expr = "the classification should be {string}")]
fn classification_should_be(world: &mut PageWatchWorld, label: String) {
    let classification = world.classification.as_ref().expect("nothing classified");
    assert_eq!(classification.label(), label, "{:?}", classification);
}

#[then("a keyword should be hit")]
fn keyword_hit(world: &mut PageWatchWorld) {
    assert_eq!(keyword_hit_of(world), Some(true));
}

#[then("no keyword should be hit")]
fn keyword_not_hit(world: &mut PageWatchWorld) {
    assert_eq!(keyword_hit_of(world), Some(false));
}

#[then(expr = "the new fingerprint should be that of {string}")]
fn new_fingerprint(world: &mut PageWatchWorld, content: String) {
    let classification = world.classification.as_ref().expect("nothing classified");
    assert_eq!(classification.fingerprint(), Some(&Fingerprint::of(&content)));
}

#[then("no fingerprint should be stored")]
fn no_fingerprint(world: &mut PageWatchWorld) {
    let classification = world.classification.as_ref().expect("nothing classified");
    assert_eq!(classification.fingerprint(), None);
}

#[then(expr = "the failure detail should be {string}")]
fn failure_detail(world: &mut PageWatchWorld, expected: String) {
    match world.classification.as_ref().expect("nothing classified") {
        Classification::FetchFailed(detail) => assert_eq!(detail, &expected),
        other => panic!("expected fetch_failed, got {:?}", other),
    }
}

fn keyword_hit_of(world: &PageWatchWorld) -> Option<bool> {
    match world.classification.as_ref()? {
        Classification::Baseline { keyword_hit, .. } | Classification::Changed { keyword_hit, .. } => {
            Some(*keyword_hit)
        }
        _ => None,
    }
}
