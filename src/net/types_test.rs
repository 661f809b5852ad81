use super::*;

// =============================================================
// UserProfile
// =============================================================

#[test]
fn user_profile_null_contact_fields_become_empty() {
    let json = serde_json::json!({
        "id": 1,
        "name": "An",
        "email": "an@x.com",
        "phone": null,
        "facebook": null
    });
    let user: UserProfile = serde_json::from_value(json).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.name, "An");
    assert_eq!(user.phone, "");
    assert_eq!(user.facebook, "");
    assert_eq!(user.zalo, "");
}

#[test]
fn user_profile_requires_id() {
    let json = serde_json::json!({ "name": "An" });
    assert!(serde_json::from_value::<UserProfile>(json).is_err());
}

// =============================================================
// MeResponse
// =============================================================

#[test]
fn me_response_success_with_user() {
    let json = serde_json::json!({
        "success": true,
        "user": { "id": 1, "name": "An", "email": "an@x.com" }
    });
    let resp: MeResponse = serde_json::from_value(json).unwrap();
    assert_eq!(resp.into_user().map(|u| u.name), Some("An".to_owned()));
}

#[test]
fn me_response_missing_user_yields_none() {
    let resp: MeResponse = serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
    assert!(resp.into_user().is_none());
}

#[test]
fn me_response_malformed_user_yields_none() {
    let json = serde_json::json!({
        "success": true,
        "user": { "name": "An", "email": "an@x.com" }
    });
    let resp: MeResponse = serde_json::from_value(json).unwrap();
    assert!(resp.success);
    assert!(resp.into_user().is_none());
}

#[test]
fn me_response_non_object_user_yields_none() {
    let resp: MeResponse = serde_json::from_str(r#"{"success":true,"user":"An"}"#).unwrap();
    assert!(resp.user.is_none());
}

#[test]
fn me_response_unsuccessful_discards_user() {
    let json = serde_json::json!({
        "success": false,
        "user": { "id": 1 },
        "message": "token revoked"
    });
    let resp: MeResponse = serde_json::from_value(json).unwrap();
    assert_eq!(resp.message.as_deref(), Some("token revoked"));
    assert!(resp.into_user().is_none());
}

#[test]
fn me_response_empty_object_is_unsuccessful() {
    let resp: MeResponse = serde_json::from_str("{}").unwrap();
    assert!(!resp.success);
    assert!(resp.user.is_none());
}

// =============================================================
// ProfileUpdate
// =============================================================

#[test]
fn profile_update_skips_unset_fields() {
    let update = ProfileUpdate { phone: Some("0900".into()), ..ProfileUpdate::default() };
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json, serde_json::json!({ "phone": "0900" }));
}

#[test]
fn profile_update_default_is_empty() {
    assert!(ProfileUpdate::default().is_empty());
    assert!(!ProfileUpdate { zalo: Some(String::new()), ..ProfileUpdate::default() }.is_empty());
}
