//! Attribute access, value sources and transformation

use froshki::{AttributeSpec, FroshkiError, Integer, Record, RecordType, Text, Value};

// ============================================================================
// Attribute Access
// ============================================================================

#[test]
fn test_attribute_access() {
    let register_form = RecordType::builder("RegisterFormInput")
        .attribute("user_id", AttributeSpec::plain())
        .attribute("user_name", AttributeSpec::plain())
        .attribute("user_age", AttributeSpec::plain())
        .attribute("password", AttributeSpec::plain())
        .build()
        .unwrap();

    let mut registration = register_form
        .record()
        .with("user_id", "drowse314")
        .with("user_age", 24)
        .with("password", "ijk2355")
        .build()
        .unwrap();

    assert_eq!(registration.get("user_id").unwrap(), &Value::from("drowse314"));
    assert_eq!(registration.get("user_name").unwrap(), &Value::Null);
    assert_eq!(registration.get("user_age").unwrap(), &Value::Int(24));
    assert_eq!(registration.get("password").unwrap(), &Value::from("ijk2355"));

    let err = registration.get("user_gender").unwrap_err();
    assert_eq!(
        err,
        FroshkiError::UnknownAttribute {
            record: "RegisterFormInput".to_string(),
            name: "user_gender".to_string(),
        }
    );

    registration.set("user_name", "ymat").unwrap();
    assert_eq!(registration.get("user_name").unwrap(), &Value::from("ymat"));

    // Type-level access still yields the specs after instantiation
    for name in ["user_id", "user_name", "user_age", "password"] {
        assert!(register_form.attribute(name).is_some());
    }
    assert!(register_form.attribute("user_gender").is_none());
}

// ============================================================================
// Value Sources
// ============================================================================

#[test]
fn test_default_values() {
    let admin_login = RecordType::builder("AdminLogin")
        .attribute("user_id", AttributeSpec::plain())
        .attribute("password", AttributeSpec::plain())
        .default_value("user_id", "root")
        .build()
        .unwrap();

    let login = admin_login
        .record()
        .with("password", "KDalyAwytT7d;I")
        .build()
        .unwrap();
    assert_eq!(login.get("user_id").unwrap(), &Value::from("root"));
}

#[test]
fn test_source_mapping() {
    let order_submit = RecordType::builder("OrderSubmit")
        .attribute("order_id", AttributeSpec::plain())
        .attribute("order_date", AttributeSpec::plain())
        .attribute("order_owner", AttributeSpec::plain())
        .attribute("address", AttributeSpec::plain())
        .attribute("billing_to", AttributeSpec::plain())
        .attribute("item_ids", AttributeSpec::plain())
        .attribute("item_volumes", AttributeSpec::plain())
        .build()
        .unwrap();

    let source: Vec<(&str, Value)> = vec![
        ("order_id", 2355.into()),
        ("order_date", "2013-08-07".into()),
        ("order_owner", "ymat".into()),
        ("address", "Saitama, Japan".into()),
        ("item_ids", vec![13, 27, 3, 48].into()),
        ("item_volumes", vec![1, 1, 3, 1].into()),
    ];
    let order = order_submit.record().source(source).build().unwrap();

    assert_eq!(order.get("order_id").unwrap(), &Value::Int(2355));
    assert_eq!(order.get("order_date").unwrap(), &Value::from("2013-08-07"));
    assert_eq!(order.get("order_owner").unwrap(), &Value::from("ymat"));
    assert_eq!(order.get("address").unwrap(), &Value::from("Saitama, Japan"));
    assert_eq!(order.get("billing_to").unwrap(), &Value::Null);
    assert_eq!(order.get("item_ids").unwrap(), &Value::from(vec![13, 27, 3, 48]));
    assert_eq!(order.get("item_volumes").unwrap(), &Value::from(vec![1, 1, 3, 1]));
}

#[cfg(feature = "serde")]
#[test]
fn test_json_source() {
    let order_submit = RecordType::builder("OrderSubmit")
        .attribute("order_id", Integer)
        .attribute("item_ids", AttributeSpec::plain())
        .build()
        .unwrap();

    let json = serde_json::json!({"order_id": "2355", "item_ids": [13, 27]});
    let mut order = order_submit.record().source_value(json).build().unwrap();
    assert!(order.validate());
    assert_eq!(order.get("order_id").unwrap(), &Value::Int(2355));
}

// ============================================================================
// Transformation
// ============================================================================

#[test]
fn test_attribute_transform() {
    let user_type = RecordType::builder("User")
        .attribute("id", Integer)
        .attribute("user_id", Text)
        .attribute("user_fname", Text)
        .attribute("user_lname", Text)
        .build()
        .unwrap();

    let mut user = user_type
        .record()
        .with("id", "1231")
        .with("user_id", 213511)
        .with("user_fname", "y")
        .with("user_lname", "mat")
        .build()
        .unwrap();
    assert!(user.validate());
    assert_eq!(user.get("id").unwrap(), &Value::Int(1231));
    assert_eq!(user.get("user_id").unwrap(), &Value::from("213511"));
    assert_eq!(user.get("user_fname").unwrap(), &Value::from("y"));
    assert_eq!(user.get("user_lname").unwrap(), &Value::from("mat"));

    user.set("id", "2142").unwrap();
    user.set("user_id", 73894).unwrap();
    // Raw until validated
    assert_eq!(user.get("id").unwrap(), &Value::from("2142"));
    assert!(user.validate());
    assert_eq!(user.get("id").unwrap(), &Value::Int(2142));
    assert_eq!(user.get("user_id").unwrap(), &Value::from("73894"));
}

#[test]
fn test_conversion_error_message() {
    let user_type = RecordType::builder("User")
        .attribute("id", Integer)
        .build()
        .unwrap();

    let mut user = user_type.record().with("id", "12a").build().unwrap();
    assert!(!user.validate());
    assert_eq!(user.errors()["id"], "data conversion error: '12a'");
    assert_eq!(user.get("id").unwrap(), &Value::from("12a"));
}

// ============================================================================
// Schema Mutation
// ============================================================================

#[test]
fn test_added_attribute_reaches_new_records_only() {
    let profile = RecordType::builder("Profile")
        .attribute("name", Text)
        .build()
        .unwrap();

    let before = Record::new(&profile).unwrap();
    profile
        .add_attribute("age", AttributeSpec::new(Integer).nullable())
        .unwrap();
    let mut after = profile.record().with("age", "31").build().unwrap();

    assert!(before.get("age").is_err());
    assert!(after.pending().contains("age"));
    after.set("name", "ymat").unwrap();
    assert!(after.validate());
    assert_eq!(after.get("age").unwrap(), &Value::Int(31));

    assert!(profile.remove_attribute("age"));
    let err = profile.record().with("age", 1).build().unwrap_err();
    assert!(err.is_unknown_attribute());
}

#[test]
fn test_derived_type_uses_base_fields() {
    let base = RecordType::builder("Base")
        .attribute("id", Integer)
        .build()
        .unwrap();
    // Instantiate the base first; the derived type must still see its fields
    Record::new(&base).unwrap();

    let derived = RecordType::builder("Derived")
        .extends(&base)
        .attribute("label", Text)
        .build()
        .unwrap();
    let mut record = derived
        .record()
        .with("id", "7")
        .with("label", "seven")
        .build()
        .unwrap();
    assert!(record.validate());
    assert_eq!(record.get("id").unwrap(), &Value::Int(7));
    assert_eq!(derived.field_names(), vec!["id".to_string(), "label".to_string()]);
}
