use chrono::NaiveDate;
use ghost_admin::filter::{group_by_day, list_view_posts, merge_posts};
use ghost_admin::time::reschedule;
use ghost_admin::{AdminError, GhostApi, ManualClock, Post, Settings, Timestamp, Token};
use std::sync::Arc;

const KEY: &str = "6489a1b2c3d4e5f6a7b8c9d0:0123456789abcdef0123456789abcdef";

fn post(id: &str, status: &str, published_at: &str) -> Post {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "status": status,
        "published_at": published_at
    }))
    .expect("valid post")
}

#[test]
fn test_token_shape_through_client() {
    let clock = Arc::new(ManualClock::new(1_769_000_000));
    let api = GhostApi::new("https://blog.example.com", KEY)
        .expect("valid client")
        .with_clock(clock.clone());

    let value = api.ensure_token().expect("token derivation");
    let token = Token::from_compact(&value).expect("compact token parses");
    assert_eq!(token.expires_at, 1_769_000_300);

    assert_eq!(value.split('.').count(), 3, "expected three segments in {}", value);

    let header = token.header().expect("header decodes");
    assert_eq!(header.alg, "HS256");
    assert_eq!(header.typ, "JWT");
    assert_eq!(header.kid, "6489a1b2c3d4e5f6a7b8c9d0");

    let claims = token.claims().expect("claims decode");
    assert_eq!(claims.exp - claims.iat, 300);
    assert_eq!(claims.aud, "/admin/");
}

#[test]
fn test_token_refresh_boundary() {
    let clock = Arc::new(ManualClock::new(1_769_000_000));
    let api = GhostApi::new("https://blog.example.com", KEY)
        .expect("valid client")
        .with_clock(clock.clone());

    let first = api.ensure_token().expect("first token");

    // 31 seconds of validity left
    clock.advance(269);
    assert_eq!(api.ensure_token().expect("cached token"), first);

    // 30 seconds left: re-derive
    clock.advance(1);
    let second = api.ensure_token().expect("refreshed token");
    assert_ne!(second, first);

    // Clones share the cache
    let clone = api.clone();
    assert_eq!(clone.ensure_token().expect("shared token"), second);
}

#[test]
fn test_credential_validation() {
    let cases = [
        ("abc", "format"),
        ("id:zzz", "secret"),
        ("id:abc", "secret"),
    ];

    for (key, expected) in cases {
        let api = GhostApi::new("https://blog.example.com", key).expect("construction defers validation");
        match (api.ensure_token(), expected) {
            (Err(AdminError::InvalidCredentialFormat), "format") => {}
            (Err(AdminError::InvalidSecretFormat(_)), "secret") => {}
            (other, _) => panic!("unexpected result for {:?}: {:?}", key, other),
        }
    }
}

#[test]
fn test_scheme_rejection_and_normalization() {
    let err = GhostApi::new("http://blog.example.com", KEY).unwrap_err();
    assert!(matches!(err, AdminError::Configuration(_)), "got {:?}", err);

    let api = GhostApi::new("https://blog.example.com/", KEY).expect("https accepted");
    assert_eq!(api.base_url(), "https://blog.example.com");
}

#[test]
fn test_group_by_day() {
    let posts = vec![
        post("1", "published", "2026-01-22T08:00:00.000Z"),
        post("2", "scheduled", "2026-01-24T10:00:00.000Z"),
        post("3", "scheduled", "2026-01-22T21:30:00.000Z"),
    ];

    let groups = group_by_day(&posts);
    let days: Vec<NaiveDate> = groups.keys().copied().collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2026, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 24).unwrap()
        ]
    );
    let first_day: Vec<&str> = groups.values().next().unwrap().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(first_day, vec!["1", "3"]);
}

#[test]
fn test_merge_posts_dedupes_and_sorts() {
    let mut posts = vec![
        post("a", "scheduled", "2026-02-10T09:00:00.000Z"),
        post("b", "published", "2026-01-05T09:00:00.000Z"),
    ];
    let incoming = vec![
        post("b", "published", "2026-01-05T09:00:00.000Z"),
        post("c", "published", "2026-01-20T09:00:00.000Z"),
    ];

    merge_posts(&mut posts, incoming);

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

#[test]
fn test_list_view_posts() {
    let posts = vec![
        post("old", "published", "2026-01-10T09:00:00.000Z"),
        post("yesterday", "published", "2026-01-22T23:00:00.000Z"),
        post("today", "published", "2026-01-23T07:00:00.000Z"),
        post("future", "scheduled", "2026-03-01T09:00:00.000Z"),
    ];

    let today = NaiveDate::from_ymd_opt(2026, 1, 23).unwrap();
    let shown: Vec<&str> = list_view_posts(&posts, today).iter().map(|p| p.id.as_str()).collect();
    assert_eq!(shown, vec!["yesterday", "today", "future"]);
}

#[test]
fn test_reschedule_to_dropped_day() {
    let old = Timestamp::parse("2026-01-23T14:45:00Z").unwrap();
    let target = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap();
    let moved = Timestamp::new(reschedule(old.0, target));
    assert_eq!(moved.iso(), "2026-01-27T14:45:00.000Z");
}

#[tokio::test]
#[ignore] // Run with: GHOST_BLOG_URL=... GHOST_ADMIN_API_KEY=... cargo test -- --ignored
async fn test_live_listing() {
    let api = Settings::from_env()
        .and_then(Settings::into_api)
        .expect("settings from environment");

    let scheduled = api.scheduled_posts().await.expect("scheduled posts");
    let tags = api.all_tags().await.expect("all tags");

    println!("{} scheduled posts, {} tags", scheduled.len(), tags.len());
}
