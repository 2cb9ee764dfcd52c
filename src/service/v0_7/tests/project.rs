use super::{session, PREFIX};
use crate::http::testing::FakeBackend;
use crate::http::Method;
use crate::resource::{ChannelResource, CollectionResource, Datatype, ExperimentResource, Resource};
use crate::service::project::NewUser;
use crate::service::ProjectService;
use serde_json::json;
use std::sync::Arc;

fn service(fake: FakeBackend) -> (ProjectService, Arc<FakeBackend>) {
    let fake = Arc::new(fake);
    let svc = ProjectService::new(session(&fake), "v0.7").unwrap();
    (svc, fake)
}

fn channel() -> Resource {
    ChannelResource::image("em", "kasthuri", "ac4", Datatype::Uint8).into()
}

#[test]
fn test_get_group_exists() {
    let (svc, fake) = service(FakeBackend::new().with_response(Method::GET, "/group/lab/", 200, b"{}"));
    assert!(svc.get_group("lab", None).unwrap());
    assert_eq!(fake.last_request().url, format!("{}group/lab/", PREFIX));
}

#[test]
fn test_get_group_doesnt_exist() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::GET, "/group/foo/", 404, b""));
    assert!(!svc.get_group("foo", None).unwrap());
}

#[test]
fn test_get_group_unknown_route_is_absent() {
    let (svc, fake) = service(FakeBackend::new());
    assert!(!svc.get_group("ghost", None).unwrap());
    assert_eq!(fake.requests().len(), 1);
}

#[test]
fn test_get_group_server_error() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::GET, "/group/lab/", 500, b"boom"));
    assert_eq!(svc.get_group("lab", None).unwrap_err().status(), Some(500));
}

#[test]
fn test_group_membership() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_json(Method::GET, "/group-member/lab/alice/", 200, json!({"result": true}))
            .with_json(Method::GET, "/group-member/lab/bob/", 200, json!({"result": false})),
    );
    assert!(svc.get_group("lab", Some("alice")).unwrap());
    assert!(!svc.get_group("lab", Some("bob")).unwrap());
    assert_eq!(fake.last_request().url, format!("{}group-member/lab/bob/", PREFIX));
}

#[test]
fn test_get_group_user_doesnt_exist() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::GET, "/group-member/lab/foo/", 404, b""));
    assert!(svc.get_group("lab", Some("foo")).unwrap_err().is_not_found());
}

#[test]
fn test_create_and_delete_group() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_response(Method::POST, "/group/lab/", 201, b"")
            .with_response(Method::DELETE, "/group/lab/", 204, b"")
            .with_response(Method::DELETE, "/group-member/lab/alice/", 204, b""),
    );
    svc.create_group("lab").unwrap();
    svc.delete_group("lab", Some("alice")).unwrap();
    svc.delete_group("lab", None).unwrap();

    let urls: Vec<String> = fake.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}group/lab/", PREFIX),
            format!("{}group-member/lab/alice/", PREFIX),
            format!("{}group/lab/", PREFIX),
        ]
    );
}

#[test]
fn test_delete_group_doesnt_exist() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::DELETE, "/group/foo/", 404, b""));
    assert!(svc.delete_group("foo", None).is_err());
}

#[test]
fn test_add_user_to_group_group_doesnt_exist() {
    let (svc, _) = service(
        FakeBackend::new()
            .with_response(Method::POST, "/group-member/lab/alice/", 201, b"")
            .with_response(Method::POST, "/group-member/foo/alice/", 404, b""),
    );
    svc.add_user_to_group("lab", "alice").unwrap();
    assert!(svc.add_user_to_group("foo", "alice").unwrap_err().is_not_found());
}

#[test]
fn test_permissions() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_json(Method::GET, "/permission/lab/kasthuri/ac4/em/", 200, json!({"permissions": ["read", "add"]}))
            .with_response(Method::POST, "/permission/lab/kasthuri/ac4/em/", 201, b"")
            .with_response(Method::DELETE, "/permission/lab/kasthuri/ac4/em/", 204, b""),
    );
    let chan = channel();
    assert_eq!(svc.get_permissions("lab", &chan).unwrap(), vec!["read", "add"]);

    svc.add_permissions("lab", &chan, &["update"]).unwrap();
    let sent: serde_json::Value = serde_json::from_slice(fake.last_request().body.as_ref().unwrap()).unwrap();
    assert_eq!(sent, json!({"permissions": ["update"]}));

    svc.delete_permissions("lab", &chan, &["read"]).unwrap();
    let req = fake.last_request();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.header_value("Content-Type"), Some("application/json"));
}

#[test]
fn test_user_roles() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_response(Method::POST, "/user-role/alice/admin", 201, b"")
            .with_response(Method::DELETE, "/user-role/alice/admin", 204, b"")
            .with_json(Method::GET, "/user-role/alice", 200, json!(["user-manager"])),
    );
    svc.add_user_role("alice", "admin").unwrap();
    svc.delete_user_role("alice", "admin").unwrap();
    assert_eq!(svc.get_user_roles("alice").unwrap(), vec!["user-manager"]);
    assert_eq!(fake.requests()[0].url, format!("{}user-role/alice/admin", PREFIX));
}

#[test]
fn test_user_lifecycle() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_response(Method::POST, "/user/jdoe", 201, b"")
            .with_json(
                Method::GET,
                "/user/jdoe",
                200,
                json!({"username": "jdoe", "firstName": "John", "lastName": "Doeski", "email": "jdoe@me.com"}),
            )
            .with_json(Method::GET, "/user/jdoe/groups", 200, json!({"groups": ["bosspublic", "jdoe-primary"]}))
            .with_response(Method::DELETE, "/user/jdoe", 204, b""),
    );

    let details = NewUser {
        first_name: Some("John"),
        last_name: Some("Doeski"),
        email: Some("jdoe@me.com"),
        password: Some("myPassW0rd"),
    };
    svc.add_user("jdoe", &details).unwrap();
    let sent: serde_json::Value = serde_json::from_slice(fake.last_request().body.as_ref().unwrap()).unwrap();
    assert_eq!(sent["first_name"], "John");
    assert_eq!(sent["password"], "myPassW0rd");

    let user = svc.get_user("jdoe").unwrap();
    assert_eq!(user.email.as_deref(), Some("jdoe@me.com"));

    let mut groups = svc.get_user_groups("jdoe").unwrap();
    groups.sort();
    assert_eq!(groups, vec!["bosspublic", "jdoe-primary"]);

    svc.delete_user("jdoe").unwrap();
}

#[test]
fn test_get_groups_invalid_user() {
    let (svc, _) = service(FakeBackend::new().with_response(Method::GET, "/user/foo/groups", 404, b""));
    assert!(svc.get_user_groups("foo").is_err());
}

#[test]
fn test_list_resources() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_json(Method::GET, "/resource/", 200, json!({"collections": ["kasthuri", "bock"]}))
            .with_json(Method::GET, "/resource/kasthuri/ac4/", 200, json!({"channels": ["em", "labels"]})),
    );
    assert_eq!(svc.list(None).unwrap(), vec!["kasthuri", "bock"]);
    assert_eq!(fake.last_request().url, format!("{}resource/", PREFIX));

    assert_eq!(svc.list(Some(&channel())).unwrap(), vec!["em", "labels"]);
}

#[test]
fn test_list_missing_key_is_invalid_response() {
    let (svc, _) = service(FakeBackend::new().with_json(
        Method::GET,
        "/resource/kasthuri/",
        200,
        json!({"channels": []}),
    ));
    let exp: Resource = ExperimentResource::new("ac4", "kasthuri", "frame").into();
    assert!(svc.list(Some(&exp)).is_err());
}

#[test]
fn test_resource_crud() {
    let (svc, fake) = service(
        FakeBackend::new()
            .with_json(Method::POST, "/resource/kasthuri/", 201, json!({"name": "kasthuri", "description": "EM"}))
            .with_json(Method::GET, "/resource/kasthuri/", 200, json!({"name": "kasthuri", "description": "EM"}))
            .with_json(Method::PUT, "/resource/kasthuri/", 200, json!({"name": "kasthuri2", "description": "EM"}))
            .with_response(Method::DELETE, "/resource/kasthuri2/", 204, b""),
    );
    let mut coll = CollectionResource::new("kasthuri");
    coll.description = "EM".to_string();
    let resource: Resource = coll.clone().into();

    assert_eq!(svc.create(&resource).unwrap(), resource);
    assert_eq!(svc.get(&resource).unwrap().name(), "kasthuri");

    coll.name = "kasthuri2".to_string();
    let renamed: Resource = coll.into();
    let updated = svc.update("kasthuri", &renamed).unwrap();
    assert_eq!(updated.name(), "kasthuri2");
    let put = fake.last_request();
    assert_eq!(put.url, format!("{}resource/kasthuri/", PREFIX));
    let body: serde_json::Value = serde_json::from_slice(put.body.as_ref().unwrap()).unwrap();
    assert_eq!(body["name"], "kasthuri2");

    svc.delete(&renamed).unwrap();
    assert_eq!(fake.last_request().url, format!("{}resource/kasthuri2/", PREFIX));
}

#[test]
fn test_requests_are_authenticated() {
    let (svc, fake) = service(FakeBackend::new().with_response(Method::POST, "/group/lab/", 201, b""));
    svc.create_group("lab").unwrap();
    assert_eq!(fake.last_request().header_value("Authorization"), Some("Token secret"));
}
