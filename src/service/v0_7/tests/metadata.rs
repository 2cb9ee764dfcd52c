use super::{session, PREFIX};
use crate::error::Error;
use crate::http::testing::FakeBackend;
use crate::http::Method;
use crate::resource::{CollectionResource, CoordinateFrameResource, Resource};
use crate::service::MetadataService;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn service(fake: FakeBackend) -> (MetadataService, Arc<FakeBackend>) {
    let fake = Arc::new(fake);
    let svc = MetadataService::new(session(&fake), "v0.7").unwrap();
    (svc, fake)
}

fn collection() -> Resource {
    CollectionResource::new("kasthuri").into()
}

#[test]
fn test_list_keys() {
    let (svc, fake) = service(FakeBackend::new().with_json(
        Method::GET,
        "/meta/kasthuri/",
        200,
        json!({"keys": ["species", "lab"]}),
    ));
    assert_eq!(svc.list(&collection()).unwrap(), vec!["species", "lab"]);
    assert_eq!(fake.last_request().url, format!("{}meta/kasthuri/", PREFIX));
}

#[test]
fn test_create_sends_one_request_per_key() {
    let (svc, fake) = service(FakeBackend::new().with_response(Method::POST, "/meta/kasthuri/", 201, b""));
    let mut kv = BTreeMap::new();
    kv.insert("lab".to_string(), "APL".to_string());
    kv.insert("species".to_string(), "mouse brain".to_string());
    svc.create(&collection(), &kv).unwrap();

    let urls: Vec<String> = fake.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}meta/kasthuri/?key=lab&value=APL", PREFIX),
            format!("{}meta/kasthuri/?key=species&value=mouse+brain", PREFIX),
        ]
    );
}

#[test]
fn test_get_values() {
    let (svc, _) = service(
        FakeBackend::new()
            .with_json(Method::GET, "key=lab", 200, json!({"key": "lab", "value": "APL"}))
            .with_json(Method::GET, "key=species", 200, json!({"key": "species", "value": "mouse"})),
    );
    let got = svc.get(&collection(), &["lab", "species"]).unwrap();
    assert_eq!(got["lab"], "APL");
    assert_eq!(got["species"], "mouse");
}

#[test]
fn test_update_and_delete() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_response(Method::PUT, "/meta/kasthuri/", 200, b"")
            .with_response(Method::DELETE, "/meta/kasthuri/", 204, b""),
    );
    let mut kv = BTreeMap::new();
    kv.insert("lab".to_string(), "JHU".to_string());
    svc.update(&collection(), &kv).unwrap();
    svc.delete(&collection(), &["lab"]).unwrap();

    let reqs = fake.requests();
    assert_eq!(reqs[0].method, Method::PUT);
    assert!(reqs[0].url.ends_with("?key=lab&value=JHU"));
    assert_eq!(reqs[1].method, Method::DELETE);
    assert!(reqs[1].url.ends_with("?key=lab"));
}

#[test]
fn test_missing_key_is_error() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::GET, "key=nope", 404, b""));
    assert!(svc.get(&collection(), &["nope"]).unwrap_err().is_not_found());
}

#[test]
fn test_coordinate_frames_have_no_metadata() {
    let (svc, fake) = service(FakeBackend::new());
    let frame: Resource = CoordinateFrameResource::new("f", (0, 1), (0, 1), (0, 1)).into();
    assert!(matches!(svc.list(&frame), Err(Error::InvalidResource(_))));
    assert!(fake.requests().is_empty());
}
