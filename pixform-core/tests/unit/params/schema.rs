use serde_json::json;

use super::*;

fn blur_like() -> Schema {
    Schema::new()
        .field(FieldSpec::integer("radius").range(1, 1024))
        .field(FieldSpec::integer("iterations").range(1, 16).optional(1))
}

#[test]
fn descriptor_json_round_trips() {
    let schema = Schema::new()
        .field(FieldSpec::one_of("axis", &["horizontal", "vertical", "both"]).describe("axis"))
        .field(FieldSpec::number("sigma").greater_than(0.0).at_most(256.0))
        .field(FieldSpec::boolean("flag").optional(false));

    let json = schema.to_json().unwrap();
    let back = Schema::from_json(&json).unwrap();
    assert_eq!(back, schema);
}

#[test]
fn descriptor_uses_flat_type_tag() {
    let v: serde_json::Value = serde_json::from_str(&blur_like().to_json().unwrap()).unwrap();
    assert_eq!(
        v["fields"][0],
        json!({ "name": "radius", "required": true, "type": "integer", "min": 1, "max": 1024 })
    );
}

#[test]
fn hand_written_descriptor_defaults_to_required() {
    let schema = Schema::from_json(r#"{"fields":[{"name":"n","type":"boolean"}]}"#).unwrap();
    assert!(schema.get("n").unwrap().required);
}

#[test]
fn inconsistent_descriptors_are_rejected() {
    let dup = Schema::new()
        .field(FieldSpec::boolean("a"))
        .field(FieldSpec::boolean("a"));
    assert!(dup.validate().unwrap_err().contains("duplicate"));

    let inverted = Schema::new().field(FieldSpec::integer("r").range(5, 1));
    assert!(inverted.validate().is_err());

    let bad_default = Schema::new().field(FieldSpec::integer("r").range(1, 4).optional(9));
    assert!(bad_default.validate().unwrap_err().contains("default of 'r'"));

    assert!(Schema::from_json(r#"{"fields":[{"name":"e","type":"enum","values":[]}]}"#).is_err());
    assert!(Schema::from_json("not json").is_err());
    assert!(Schema::from_json(r#"{"fields":[{"name":"x","type":"matrix"}]}"#).is_err());
}

#[test]
fn integer_check_is_strict() {
    let f = FieldSpec::integer("radius").range(1, 10);
    assert!(f.check(&json!(3)).is_ok());
    assert!(f.check(&json!(3.0)).unwrap_err().contains("expected an integer"));
    assert!(f.check(&json!("3")).unwrap_err().contains("got a string"));
    assert!(f.check(&json!(0)).unwrap_err().contains(">= 1"));
    assert!(f.check(&json!(11)).unwrap_err().contains("<= 10"));
    assert!(f.check(&json!(u64::MAX)).unwrap_err().contains("out of range"));
}

#[test]
fn number_check_honours_exclusive_minimum() {
    let f = FieldSpec::number("sigma").greater_than(0.0).at_most(256.0);
    assert!(f.check(&json!(2.5)).is_ok());
    assert!(f.check(&json!(2)).is_ok());
    assert!(f.check(&json!(0.0)).unwrap_err().contains("> 0"));
    assert!(f.check(&json!(-1)).is_err());
    assert!(f.check(&json!(300)).is_err());
    assert!(f.check(&json!(true)).unwrap_err().contains("expected a number"));
}

#[test]
fn enum_and_boolean_checks() {
    let axis = FieldSpec::one_of("axis", &["horizontal", "vertical"]);
    assert!(axis.check(&json!("vertical")).is_ok());
    let err = axis.check(&json!("diagonal")).unwrap_err();
    assert!(err.contains("one of [horizontal, vertical]"));
    assert!(axis.check(&json!(1)).is_err());

    let b = FieldSpec::boolean("b");
    assert!(b.check(&json!(false)).is_ok());
    assert!(b.check(&json!("false")).is_err());
}
