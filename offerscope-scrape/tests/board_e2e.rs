mod common;

use common::{detail_page, init_test_tracing, latin9, listing_page};
use offerscope_common::{Format, OfferId};
use offerscope_scrape::{IsaBoard, ScrapeError, Scraper};
use std::collections::HashSet;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PORTAL: &str = "/imoniteur_ISAP/!PORTAL14S.portalCell";

fn board(server: &MockServer) -> IsaBoard {
    IsaBoard::new(&format!("{}/imoniteur_ISAP/", server.uri())).unwrap()
}

async fn mount_listing(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(PORTAL))
        .and(query_param("ww_k_cell", "308197177"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(latin9(&listing_page(ids))),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, salary: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(PORTAL))
        .and(query_param("ww_k_cell", "2742535167"))
        .and(query_param("ww_i_stageview", id))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(latin9(&detail_page(salary))))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrape_new_fetches_only_unknown_offer() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_listing(&server, &["A1", "A2"]).await;
    mount_detail(&server, "A1", "1000 CHF", 0).await;
    mount_detail(&server, "A2", "3500 CHF / mois", 1).await;

    let scraper = Scraper::new(board(&server));
    let known = HashSet::from([OfferId::new("A1").unwrap()]);
    let mut progress = Vec::new();
    let offers = scraper
        .scrape_new(&known, |total, done| progress.push((total, done)))
        .await
        .unwrap();

    assert_eq!(progress, vec![(1, 0), (1, 1)]);
    assert_eq!(offers.len(), 1);
    let offer = &offers[0];
    assert_eq!(offer.id.as_str(), "A2");
    assert_eq!(offer.company, "Société A2");
    assert_eq!(offer.location, "Zürich");
    assert_eq!(offer.format, vec![Format::Internship, Format::Project]);
    assert_eq!(offer.professor, None);
    assert_eq!((offer.registered, offer.positions), (4, 2));
    assert_eq!(offer.salary, "3500 CHF / mois");
    assert_eq!(offer.hiring_time, "Été 2025");
    assert_eq!(offer.description, "Réseaux électriques");
    assert_eq!(offer.related_masters, vec!["Génie électrique"]);
}

#[tokio::test]
async fn empty_listing_is_no_jobs_found() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_listing(&server, &[]).await;

    let scraper = Scraper::new(board(&server));
    let err = scraper.detect(&HashSet::new()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::NoJobsFound));
}

#[tokio::test]
async fn detail_failure_fails_the_batch_with_its_url() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_listing(&server, &["B1"]).await;
    Mock::given(method("GET"))
        .and(path(PORTAL))
        .and(query_param("ww_i_stageview", "B1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = Scraper::new(board(&server));
    let err = scraper
        .scrape(&[OfferId::new("B1").unwrap()], |_, _| {})
        .await
        .unwrap_err();

    match err {
        ScrapeError::Fetch(fetch) => assert!(fetch.url.contains("ww_i_stageview=B1")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn listing_failure_is_a_fetch_error() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let scraper = Scraper::new(board(&server));
    let err = scraper.detect(&HashSet::new()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch(_)));
}
