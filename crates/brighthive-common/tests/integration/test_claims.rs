use brighthive_common::{
    claims::{names, ClaimSet, ClaimsError},
    permission::{Permission, DATA_DICT_EDIT, DATA_EDIT, DATA_VIEW},
    role::Role,
};
use serde_json::{json, Value};

fn full_payload() -> Value {
    json!({
        "iss": "brighthive-authserver",
        "aud": [
            "brighthive-data-trust-manager",
            "brighthive-data-catalog-manager",
            "brighthive-governance-api",
            "brighthive-permissions-service",
            "brighthive-data-uploader-service",
            "brighthive-authserver"
        ],
        "iat": 1621884448,
        "exp": 1623958048,
        "brighthive-access-token": "2RjWW1X7mihQ9xA1GtC3iXF8ndu2xsZlD7lxQPUX5k",
        "brighthive-super-admin": true,
        "brighthive-org-role": {
            "3f9d7c54-7a1e-4d0c-9b8e-1c2a7e0f6a11": "admin",
            "8c1e6b0a-2d4f-4b59-a3c7-5e9d1f0b2c33": "user",
            "0b7a5d3e-9c2f-4e81-b6a4-7d3c1e9f5a22": "third-party"
        },
        "brighthive-collaboration-role": {
            "a4c2e8f1-6b3d-4a97-8e5c-2f1d9b7a3c44": "user"
        },
        "brighthive-data-resource-claims": {
            "5d8e2a1c-7f3b-4c96-a1e4-9b6d3f2c8e55": {
                "role": "Admin",
                "permissions": [
                    "data:view",
                    "data:download",
                    "data:edit",
                    "data-dict:view",
                    "data-dict:download",
                    "data-dict:edit"
                ]
            }
        }
    })
}

fn minimal_payload() -> Value {
    json!({
        "iss": "brighthive-authserver",
        "aud": ["brighthive-governance-api"],
        "iat": 1000,
        "exp": 2000,
        "brighthive-access-token": "opaque",
    })
}

fn with(mut payload: Value, claim: &str, value: Value) -> Value {
    payload[claim] = value;
    payload
}

fn without(mut payload: Value, claim: &str) -> Value {
    payload.as_object_mut().unwrap().remove(claim);
    payload
}

#[track_caller]
fn malformed_claim(payload: Value) -> &'static str {
    match ClaimSet::try_from(payload) {
        Err(ClaimsError::Shape { claim, .. }) => claim,
        Err(ClaimsError::Missing(claim)) => claim,
        other => panic!("expected a claim error, got {other:?}"),
    }
}

#[test_log::test]
fn parses_documented_token() {
    let claims = ClaimSet::try_from(full_payload()).unwrap();

    assert_eq!("brighthive-authserver", claims.issuer());
    assert_eq!(6, claims.audience().len());
    assert!(claims.has_audience("brighthive-governance-api"));
    assert_eq!(1621884448, claims.issued_at());
    assert_eq!(1623958048, claims.expires_at());
    assert_eq!(
        "2RjWW1X7mihQ9xA1GtC3iXF8ndu2xsZlD7lxQPUX5k",
        claims.access_token()
    );
    assert!(claims.is_super_admin());
    assert_eq!(
        Some(&Role::ThirdParty),
        claims
            .org_roles()
            .get("0b7a5d3e-9c2f-4e81-b6a4-7d3c1e9f5a22")
    );
    assert_eq!(
        Some(&Role::User),
        claims
            .collaboration_roles()
            .get("a4c2e8f1-6b3d-4a97-8e5c-2f1d9b7a3c44")
    );

    let resource = &claims.resource_claims()["5d8e2a1c-7f3b-4c96-a1e4-9b6d3f2c8e55"];
    assert_eq!(Role::Admin, resource.role);
    assert_eq!(6, resource.permissions.len());
    assert!(resource.has_permission(&DATA_DICT_EDIT.parse::<Permission>().unwrap()));
}

#[test_log::test]
fn absent_custom_claims_default() {
    let claims = ClaimSet::try_from(minimal_payload()).unwrap();

    assert!(!claims.is_super_admin());
    assert!(claims.org_roles().is_empty());
    assert!(claims.collaboration_roles().is_empty());
    assert!(claims.resource_claims().is_empty());
}

#[test_log::test]
fn absent_super_admin_is_false() {
    let absent = ClaimSet::try_from(minimal_payload()).unwrap();
    let explicit = ClaimSet::try_from(with(
        minimal_payload(),
        names::SUPER_ADMIN,
        json!(false),
    ))
    .unwrap();

    assert_eq!(absent, explicit);
    assert_eq!(absent.fingerprint(), explicit.fingerprint());
}

#[test_log::test]
fn wrong_shape_is_not_defaulted() {
    assert_eq!(
        names::SUPER_ADMIN,
        malformed_claim(with(minimal_payload(), names::SUPER_ADMIN, json!("yes")))
    );
    assert_eq!(
        names::SUPER_ADMIN,
        malformed_claim(with(minimal_payload(), names::SUPER_ADMIN, Value::Null))
    );
    assert_eq!(
        names::ORG_ROLE,
        malformed_claim(with(
            minimal_payload(),
            names::ORG_ROLE,
            json!(["org-1", "admin"])
        ))
    );
    assert_eq!(
        names::ORG_ROLE,
        malformed_claim(with(
            minimal_payload(),
            names::ORG_ROLE,
            json!({ "org-1": "owner" })
        ))
    );
    assert_eq!(
        names::COLLABORATION_ROLE,
        malformed_claim(with(
            minimal_payload(),
            names::COLLABORATION_ROLE,
            json!({ "collab-1": 1 })
        ))
    );
    assert_eq!(
        names::DATA_RESOURCE_CLAIMS,
        malformed_claim(with(
            minimal_payload(),
            names::DATA_RESOURCE_CLAIMS,
            json!({ "res-1": { "role": "Admin" } })
        ))
    );
    assert_eq!(
        names::DATA_RESOURCE_CLAIMS,
        malformed_claim(with(
            minimal_payload(),
            names::DATA_RESOURCE_CLAIMS,
            json!({ "res-1": { "role": "Admin", "permissions": [""] } })
        ))
    );
}

#[test_log::test]
fn standard_claims_are_mandatory() {
    for claim in [
        names::ISSUER,
        names::AUDIENCE,
        names::ISSUED_AT,
        names::EXPIRES_AT,
        names::ACCESS_TOKEN,
    ] {
        assert_eq!(claim, malformed_claim(without(minimal_payload(), claim)));
    }

    assert_eq!(
        names::AUDIENCE,
        malformed_claim(with(
            minimal_payload(),
            names::AUDIENCE,
            json!("brighthive-governance-api")
        ))
    );
    assert_eq!(
        names::ISSUED_AT,
        malformed_claim(with(minimal_payload(), names::ISSUED_AT, json!("1000")))
    );
}

#[test_log::test]
fn fractional_timestamps() {
    let claims = ClaimSet::try_from(with(
        with(minimal_payload(), names::ISSUED_AT, json!(1000.0)),
        names::EXPIRES_AT,
        json!(2000.0),
    ))
    .unwrap();
    assert_eq!(ClaimSet::try_from(minimal_payload()).unwrap(), claims);

    let claims = ClaimSet::try_from(with(
        with(minimal_payload(), names::ISSUED_AT, json!(1000.25)),
        names::EXPIRES_AT,
        json!(1999.75),
    ))
    .unwrap();
    assert_eq!(1001, claims.issued_at());
    assert_eq!(1999, claims.expires_at());

    assert_eq!(
        names::EXPIRES_AT,
        malformed_claim(with(minimal_payload(), names::EXPIRES_AT, json!(1e300)))
    );
    assert!(matches!(
        ClaimSet::try_from(with(
            with(minimal_payload(), names::ISSUED_AT, json!(1000.5)),
            names::EXPIRES_AT,
            json!(1001.5),
        )),
        Err(ClaimsError::Invariant(_))
    ));
}

#[test_log::test]
fn opaque_permissions() {
    let claims = ClaimSet::try_from(with(
        minimal_payload(),
        names::DATA_RESOURCE_CLAIMS,
        json!({ "res-1": { "role": "Admin", "permissions": [DATA_VIEW, "catalog"] } }),
    ))
    .unwrap();

    let resource = &claims.resource_claims()["res-1"];
    assert!(resource.has_permission(&perm_of("catalog")));
    assert_eq!(Role::Admin, perm_of("catalog").min_role());
}

fn perm_of(s: &str) -> Permission {
    s.parse().unwrap()
}

#[test_log::test]
fn temporal_and_audience_invariants() {
    for payload in [
        with(minimal_payload(), names::AUDIENCE, json!([])),
        with(minimal_payload(), names::ISSUED_AT, json!(0)),
        with(minimal_payload(), names::EXPIRES_AT, json!(1000)),
        with(minimal_payload(), names::EXPIRES_AT, json!(999)),
    ] {
        assert!(matches!(
            ClaimSet::try_from(payload),
            Err(ClaimsError::Invariant(_))
        ));
    }

    assert!(matches!(
        ClaimSet::try_from(json!([1, 2, 3])),
        Err(ClaimsError::NotAnObject)
    ));
}

#[test_log::test]
fn fingerprint_tracks_content() {
    let claims = ClaimSet::try_from(full_payload()).unwrap();
    let same = ClaimSet::try_from(full_payload()).unwrap();
    assert_eq!(claims.fingerprint(), same.fingerprint());
    assert_eq!(64, claims.fingerprint().to_string().len());

    let other_permissions = ClaimSet::try_from(with(
        full_payload(),
        names::DATA_RESOURCE_CLAIMS,
        json!({
            "5d8e2a1c-7f3b-4c96-a1e4-9b6d3f2c8e55": {
                "role": "Admin",
                "permissions": [DATA_VIEW, DATA_EDIT]
            }
        }),
    ))
    .unwrap();
    assert_ne!(claims.fingerprint(), other_permissions.fingerprint());

    let later = ClaimSet::try_from(with(full_payload(), names::EXPIRES_AT, json!(1623958049)))
        .unwrap();
    assert_ne!(claims.fingerprint(), later.fingerprint());
}

#[test_log::test]
fn unknown_claims_are_ignored() {
    let claims = ClaimSet::try_from(with(minimal_payload(), "sub", json!("someone"))).unwrap();
    assert_eq!(ClaimSet::try_from(minimal_payload()).unwrap(), claims);
}
