//! Factory engine tests
//!
//! Scenario data follows a small user-directory domain: a `User` model
//! with defaulted display name, enum status and self-referential
//! followers, plus a behavioral `Node` base for the mixin form.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use schema_forge_sdk::{
    is_factory_built, register, Behavior, EnumDescriptor, Factory, FactoryError, FieldType, Forge,
    ModelType, PropertySpec, Schema, SchemaBuilder, TextEncoding, Value,
};

static USER_STATUS: Lazy<Arc<EnumDescriptor>> = Lazy::new(|| {
    Arc::new(EnumDescriptor::new("UserStatus", [("ACTIVE", 1), ("INACTIVE", 2)]).unwrap())
});

fn fixed_instant() -> DateTime<Utc> {
    "2020-01-21T02:48:39.918Z".parse().unwrap()
}

struct UserSchema;

impl Schema for UserSchema {
    fn schema_name() -> &'static str {
        "User"
    }

    fn describe(schema: &mut SchemaBuilder) {
        schema
            .field(0, "id", PropertySpec::new(FieldType::Text))
            .field(4, "email", PropertySpec::new(FieldType::Text))
            .field(1, "givenName", PropertySpec::new(FieldType::Text))
            .field(2, "familyName", PropertySpec::new(FieldType::Text))
            .field(
                3,
                "displayName",
                PropertySpec::new(FieldType::Text).with_default(|ctx| {
                    let given = ctx.get("givenName");
                    let family = ctx.get("familyName");
                    Value::Text(format!(
                        "{} {}",
                        given.as_text().unwrap_or(""),
                        family.as_text().unwrap_or("")
                    ))
                }),
            )
            .field(
                5,
                "registeredAt",
                PropertySpec::new(FieldType::Timestamp)
                    .with_default(|_| Value::Timestamp(fixed_instant())),
            )
            .field(
                6,
                "status",
                PropertySpec::new(FieldType::Enum(USER_STATUS.clone()))
                    .with_default(|_| Value::Integer(1)),
            )
            .field(
                7,
                "followers",
                PropertySpec::new(FieldType::model(user_model))
                    .repeated()
                    .with_default(|_| Value::List(Vec::new())),
            );
    }
}

static USER_MODEL: Lazy<Arc<ModelType>> =
    Lazy::new(|| Factory::build(register::<UserSchema>().unwrap()));

fn user_model() -> Arc<ModelType> {
    USER_MODEL.clone()
}

fn john_forge() -> Forge {
    Forge::new()
        .set("id", "1")
        .set("email", "example@example")
        .set("givenName", "John")
        .set("familyName", "Doe")
}

mod user_model_tests {
    use super::*;

    #[test]
    fn test_property_names_in_ordinal_order() {
        assert_eq!(
            user_model().property_names(),
            vec![
                "id",
                "givenName",
                "familyName",
                "displayName",
                "email",
                "registeredAt",
                "status",
                "followers",
            ]
        );
    }

    #[test]
    fn test_properties_are_reachable() {
        let model = user_model();
        let properties = model.properties();
        assert_eq!(properties.get(4).map(|p| p.key()), Some("email"));
        assert_eq!(model.name(), "Factory(User)");
    }

    #[test]
    fn test_forge_with_defaults() {
        let user = user_model().construct(&john_forge()).unwrap();
        assert_eq!(user.get("displayName"), Some(&Value::from("John Doe")));
        assert_eq!(user.get("status"), Some(&Value::Integer(1)));
        assert_eq!(
            user.get("registeredAt"),
            Some(&Value::Timestamp(fixed_instant()))
        );
        assert_eq!(user.get("followers"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn test_forge_without_defaults() {
        let follower = user_model()
            .construct(
                &Forge::new()
                    .set("id", "2")
                    .set("email", "another@another")
                    .set("givenName", "Anna")
                    .set("familyName", "Doe"),
            )
            .unwrap();
        let user = user_model()
            .construct(
                &john_forge()
                    .set("displayName", "Doe, John")
                    .set("registeredAt", fixed_instant())
                    .set("status", 2i64)
                    .set("followers", vec![Value::Instance(follower.clone())]),
            )
            .unwrap();

        assert_eq!(user.get("displayName"), Some(&Value::from("Doe, John")));
        assert_eq!(user.get("status"), Some(&Value::Integer(2)));
        assert_eq!(
            user.get("followers").and_then(Value::as_list).map(<[Value]>::len),
            Some(1)
        );
    }

    #[test]
    fn test_explicit_null_still_defaults() {
        let user = user_model()
            .construct(&john_forge().set("displayName", Value::Null))
            .unwrap();
        assert_eq!(user.get("displayName"), Some(&Value::from("John Doe")));
    }

    #[test]
    fn test_absent_field_resolves_to_null() {
        // no email supplied and no default declared: construction succeeds
        let user = user_model()
            .construct(
                &Forge::new()
                    .set("id", "1")
                    .set("givenName", "John")
                    .set("familyName", "Doe"),
            )
            .unwrap();
        assert_eq!(user.get("email"), Some(&Value::Null));
    }

    #[test]
    fn test_from_values() {
        let user = user_model()
            .from_values(vec![
                Value::from("1"),
                Value::from("John"),
                Value::from("Doe"),
                Value::from("Doe, John"),
                Value::from("example@example"),
                Value::Timestamp(fixed_instant()),
                Value::Integer(2),
                Value::List(Vec::new()),
            ])
            .unwrap();
        assert_eq!(user.get("displayName"), Some(&Value::from("Doe, John")));
        assert_eq!(user.get("email"), Some(&Value::from("example@example")));
        assert_eq!(user.get("status"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_values_round_trip() {
        let user = user_model()
            .construct(&john_forge().set("displayName", "Doe, John"))
            .unwrap();
        let rebuilt = user_model().from_values(user.to_values()).unwrap();
        assert_eq!(rebuilt, user);
    }

    #[test]
    fn test_from_strict_values_length_check() {
        let err = user_model()
            .from_strict_values(vec![Value::from("1")])
            .unwrap_err();
        assert!(matches!(
            err,
            FactoryError::LengthMismatch {
                expected: 8,
                found: 1
            }
        ));
    }

    #[test]
    fn test_from_plain_object() {
        let user = user_model()
            .construct(&john_forge().set("displayName", "Doe, John"))
            .unwrap();
        let rebuilt = user_model().from_plain_object(user.to_plain_object()).unwrap();
        assert_eq!(rebuilt, user);
    }

    #[test]
    fn test_from_json_string() {
        let user = user_model()
            .construct(
                &john_forge()
                    .set("displayName", "Doe, John")
                    .set("registeredAt", fixed_instant()),
            )
            .unwrap();

        let json = serde_json::to_string(&user.to_json().unwrap()).unwrap();
        let parsed = user_model().from_json_str(&json).unwrap();

        assert_eq!(parsed.get("displayName"), Some(&Value::from("Doe, John")));
        assert_eq!(
            parsed.get("registeredAt"),
            Some(&Value::Timestamp(fixed_instant()))
        );
        // status was defaulted, serialized as "ACTIVE" and parsed back
        assert_eq!(parsed.get("status"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_from_json_accepts_ordinal_arrays() {
        let json = serde_json::json!([
            "1",
            "John",
            "Doe",
            "Doe, John",
            "example@example",
            "2020-01-21T02:48:39.918Z",
            "INACTIVE",
            []
        ]);
        let user = user_model().from_json(&json).unwrap();
        assert_eq!(user.get("status"), Some(&Value::Integer(2)));
        assert_eq!(user.get("displayName"), Some(&Value::from("Doe, John")));
    }

    #[test]
    fn test_default_reads_only_lower_ordinals() {
        struct OrderSchema;

        impl Schema for OrderSchema {
            fn schema_name() -> &'static str {
                "OrderProbe"
            }

            fn describe(schema: &mut SchemaBuilder) {
                schema
                    .field(
                        0,
                        "early",
                        PropertySpec::new(FieldType::Text).with_default(|ctx| {
                            // `late` has a higher ordinal: only the
                            // unresolved placeholder is observable
                            match ctx.get("late") {
                                Value::Null => Value::from("saw placeholder"),
                                other => other,
                            }
                        }),
                    )
                    .field(1, "late", PropertySpec::new(FieldType::Text));
            }
        }

        let model = Factory::build(register::<OrderSchema>().unwrap());
        let instance = model
            .construct(&Forge::new().set("late", "supplied"))
            .unwrap();
        assert_eq!(instance.get("early"), Some(&Value::from("saw placeholder")));
        assert_eq!(instance.get("late"), Some(&Value::from("supplied")));
    }

    #[test]
    fn test_membership_predicate() {
        let user = user_model().construct(&john_forge()).unwrap();
        let value = Value::Instance(user);
        assert!(user_model().is_instance(&value));
        assert!(is_factory_built(&value));
        assert!(!is_factory_built(&Value::from("1")));

        let other = Factory::build(register::<UserSchema>().unwrap());
        // same schema, distinct model type
        assert!(!other.is_instance(&value));
    }
}

mod encoding_tests {
    use super::*;

    fn stringify_forge() -> Forge {
        john_forge()
            .set("displayName", "Doe, John")
            .set("registeredAt", fixed_instant())
    }

    #[test]
    fn test_stringify_is_deterministic() {
        let expected =
            r#"["1","John","Doe","Doe, John","example@example","2020-01-21T02:48:39.918Z","ACTIVE",[]]"#;

        let first = user_model()
            .stringify(&stringify_forge(), TextEncoding::Base64)
            .unwrap();
        let second = user_model()
            .stringify(&stringify_forge(), TextEncoding::Base64)
            .unwrap();
        assert_eq!(first, second);

        let decoded = schema_forge_sdk::serialize::text::decode(&first, TextEncoding::Base64).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), expected);
    }

    #[test]
    fn test_parse_reverses_stringify() {
        let text = user_model()
            .stringify(&stringify_forge(), TextEncoding::Base64)
            .unwrap();
        let parsed = user_model().parse(&text, TextEncoding::Base64).unwrap();

        assert_eq!(parsed.get("displayName"), Some(&Value::from("Doe, John")));
        assert_eq!(
            parsed.get("registeredAt"),
            Some(&Value::Timestamp(fixed_instant()))
        );
        assert_eq!(parsed.get("status"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_hex_round_trip() {
        let text = user_model()
            .stringify(&stringify_forge(), TextEncoding::Hex)
            .unwrap();
        let parsed = user_model().parse(&text, TextEncoding::Hex).unwrap();
        assert_eq!(parsed.get("displayName"), Some(&Value::from("Doe, John")));
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let follower = user_model()
            .construct(
                &Forge::new()
                    .set("id", "2")
                    .set("email", "another@another")
                    .set("givenName", "Anna")
                    .set("familyName", "Doe"),
            )
            .unwrap();
        let user = user_model()
            .construct(
                &stringify_forge()
                    .set("status", 2i64)
                    .set("followers", vec![Value::Instance(follower)]),
            )
            .unwrap();

        let bytes = user.encode().unwrap();
        let decoded = user_model().decode(&bytes).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_encode_from_forge() {
        let bytes = user_model().encode(&stringify_forge()).unwrap();
        let decoded = user_model().decode(&bytes).unwrap();
        assert_eq!(decoded.get("id"), Some(&Value::from("1")));
    }
}

mod mixin_tests {
    use super::*;

    struct NodeSchema;

    impl Schema for NodeSchema {
        fn schema_name() -> &'static str {
            "Node"
        }

        fn describe(schema: &mut SchemaBuilder) {
            schema.field(0, "id", PropertySpec::new(FieldType::Text));
        }
    }

    struct UserNodeSchema;

    impl Schema for UserNodeSchema {
        fn schema_name() -> &'static str {
            "UserNode"
        }

        fn describe(schema: &mut SchemaBuilder) {
            schema
                .extends::<NodeSchema>()
                .field(1, "displayName", PropertySpec::new(FieldType::Text))
                .field(
                    2,
                    "registeredAt",
                    PropertySpec::new(FieldType::Timestamp)
                        .with_default(|_| Value::Timestamp(fixed_instant())),
                );
        }
    }

    fn node_behavior(calls: Arc<AtomicUsize>, seen: Arc<Mutex<Vec<Value>>>) -> Behavior {
        Behavior::new("Node")
            .method("describe", |instance, _args| {
                let id = instance
                    .get("id")
                    .and_then(Value::as_text)
                    .unwrap_or_default();
                Value::Text(format!("node:{id}"))
            })
            .static_op("kind", |model, _args| Value::Text(model.name().to_string()))
            .on_construct(move |instance| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock()
                    .unwrap()
                    .push(instance.get("registeredAt").cloned().unwrap_or(Value::Null));
                Ok(())
            })
    }

    #[test]
    fn test_operations_are_shared_by_capability_copy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let node = Factory::build_with(
            node_behavior(calls, seen),
            register::<NodeSchema>().unwrap(),
        );
        let user = Factory::extend(&node, register::<UserNodeSchema>().unwrap()).unwrap();

        let node_op = node.method("describe").unwrap();
        let user_op = user.method("describe").unwrap();
        assert!(Arc::ptr_eq(&node_op, &user_op));

        let node_static = node.static_op("kind").unwrap();
        let user_static = user.static_op("kind").unwrap();
        assert!(Arc::ptr_eq(&node_static, &user_static));

        assert_eq!(user.name(), "Mixin(Node)");
        assert_eq!(
            user.call_static("kind", &[]).unwrap(),
            Value::from("Mixin(Node)")
        );
    }

    #[test]
    fn test_base_constructor_runs_once_with_resolved_forge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let node = Factory::build_with(
            node_behavior(calls.clone(), seen.clone()),
            register::<NodeSchema>().unwrap(),
        );
        let user = Factory::extend(&node, register::<UserNodeSchema>().unwrap()).unwrap();

        let instance = user
            .construct(&Forge::new().set("id", "1").set("displayName", "John"))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // the hook observed the default already resolved
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[Value::Timestamp(fixed_instant())]
        );
        assert_eq!(
            instance.to_values(),
            vec![
                Value::from("1"),
                Value::from("John"),
                Value::Timestamp(fixed_instant()),
            ]
        );
        assert_eq!(instance.call("describe", &[]).unwrap(), Value::from("node:1"));
    }

    #[test]
    fn test_membership_follows_the_ancestry_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let node = Factory::build_with(
            node_behavior(calls, seen),
            register::<NodeSchema>().unwrap(),
        );
        let user = Factory::extend(&node, register::<UserNodeSchema>().unwrap()).unwrap();

        let instance = user.construct(&Forge::new().set("id", "1")).unwrap();
        let value = Value::Instance(instance);
        assert!(user.is_instance(&value));
        assert!(node.is_instance(&value));

        let plain_node = node.construct(&Forge::new().set("id", "9")).unwrap();
        let node_value = Value::Instance(plain_node);
        assert!(node.is_instance(&node_value));
        assert!(!user.is_instance(&node_value));
    }

    #[test]
    fn test_extend_rejects_conflicting_tables() {
        struct RenumberedSchema;

        impl Schema for RenumberedSchema {
            fn schema_name() -> &'static str {
                "Renumbered"
            }

            fn describe(schema: &mut SchemaBuilder) {
                schema
                    .field(0, "displayName", PropertySpec::new(FieldType::Text))
                    .field(1, "id", PropertySpec::new(FieldType::Text));
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let node = Factory::build_with(
            node_behavior(calls, seen),
            register::<NodeSchema>().unwrap(),
        );
        let err = Factory::extend(&node, register::<RenumberedSchema>().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            schema_forge_sdk::RegistrationError::OrdinalConflict { .. }
        ));
    }

    #[test]
    fn test_hook_failure_surfaces_as_behavior_fault() {
        let failing =
            Behavior::new("Fussy").on_construct(|_| -> anyhow::Result<()> { anyhow::bail!("nope") });
        let model = Factory::build_with(failing, register::<NodeSchema>().unwrap());
        let err = model.construct(&Forge::new().set("id", "1")).unwrap_err();
        assert!(matches!(err, FactoryError::Behavior(_)));
    }

    #[test]
    fn test_unknown_operation_faults() {
        let model = Factory::build(register::<NodeSchema>().unwrap());
        let instance = model.construct(&Forge::new().set("id", "1")).unwrap();
        assert!(matches!(
            instance.call("vanish", &[]).unwrap_err(),
            FactoryError::UnknownOperation { .. }
        ));
    }
}
