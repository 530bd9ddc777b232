use gpc_downloader::catalog::http::Envelope;
use gpc_downloader::catalog::{find_language, CatalogError, Gs1ApiConfig, LanguageSelector};
use gpc_downloader::FileFormat;

use crate::support::fake_catalog::language;

#[test]
fn test_endpoint_urls() {
    let config = Gs1ApiConfig::default();
    assert_eq!(
        config.languages_url(),
        "https://gpc-api.gs1.org/api/browser/language/all"
    );
    assert_eq!(
        config.publications_url(30),
        "https://gpc-api.gs1.org/api/browser/publication?languageId=30"
    );
    assert_eq!(
        config.download_url(1234, FileFormat::Json),
        "https://gpc-api.gs1.org/api/blob/download/publication/1234/json"
    );
    assert_eq!(
        config.dynamic_download_url(1234, FileFormat::Xlsx),
        "https://gpc-api.gs1.org/api/blob/dynamic/download/publication/1234/xlsx"
    );
}

#[test]
fn test_mirror_base_url() {
    let config = Gs1ApiConfig::default().with_base_url("http://127.0.0.1:8080/");
    assert_eq!(
        config.languages_url(),
        "http://127.0.0.1:8080/api/browser/language/all"
    );
}

#[test]
fn test_envelope_requires_both_flags() {
    let ok: Envelope<Vec<u32>> =
        serde_json::from_str(r#"{"statusCode":200,"isSuccess":true,"result":[1,2]}"#).unwrap();
    assert_eq!(ok.into_result().unwrap(), vec![1, 2]);

    let not_success: Envelope<Vec<u32>> =
        serde_json::from_str(r#"{"statusCode":200,"isSuccess":false,"result":[]}"#).unwrap();
    assert!(matches!(
        not_success.into_result(),
        Err(CatalogError::ProtocolViolation(_))
    ));

    let wrong_status: Envelope<Vec<u32>> =
        serde_json::from_str(r#"{"statusCode":500,"isSuccess":true,"result":[]}"#).unwrap();
    assert!(matches!(
        wrong_status.into_result(),
        Err(CatalogError::ProtocolViolation(_))
    ));
}

#[test]
fn test_selector_prefers_listing_order() {
    let languages = vec![language(1, "EN"), language(2, "EN"), language(30, "HR")];

    let found = find_language(&languages, &LanguageSelector::parse("en")).unwrap();
    assert_eq!(found.language_id, 1);

    let found = find_language(&languages, &LanguageSelector::parse("2")).unwrap();
    assert_eq!(found.language_id, 2);

    assert!(find_language(&languages, &LanguageSelector::parse("99")).is_none());
    assert!(find_language(&languages, &LanguageSelector::parse("Language 30")).is_some());
}
