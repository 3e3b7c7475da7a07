//! Serde helpers for objective values, which may be infinite.
//!
//! JSON has no literal for infinity, and serde_json writes non-finite floats
//! as `null`. Use with `#[serde(with = "ggs_types::non_finite")]`: finite
//! values stay plain numbers, and non-finite values are written as the
//! strings `"inf"`, `"-inf"` or `"nan"`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Tag(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(v) => Ok(v),
        Repr::Tag(tag) => match tag.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(D::Error::custom(format!(
                "expected a number, \"inf\", \"-inf\" or \"nan\", got \"{other}\""
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Scored {
        #[serde(with = "crate::non_finite")]
        value: f64,
    }

    fn round_trip(value: f64) -> (String, f64) {
        let json = serde_json::to_string(&Scored { value }).unwrap();
        let back: Scored = serde_json::from_str(&json).unwrap();
        (json, back.value)
    }

    #[test]
    fn finite_values_stay_numbers() {
        assert_eq!(round_trip(1.5), (r#"{"value":1.5}"#.to_string(), 1.5));
        assert_eq!(round_trip(-0.25).1, -0.25);
    }

    #[test]
    fn infinities_are_tagged() {
        assert_eq!(
            round_trip(f64::INFINITY),
            (r#"{"value":"inf"}"#.to_string(), f64::INFINITY)
        );
        assert_eq!(
            round_trip(f64::NEG_INFINITY),
            (r#"{"value":"-inf"}"#.to_string(), f64::NEG_INFINITY)
        );
        assert!(round_trip(f64::NAN).1.is_nan());
    }

    #[test]
    fn integer_json_is_accepted() {
        let back: Scored = serde_json::from_str(r#"{"value":3}"#).unwrap();
        assert_eq!(back.value, 3.0);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = serde_json::from_str::<Scored>(r#"{"value":"infinity"}"#).unwrap_err();
        assert!(err.to_string().contains("infinity"));
        assert!(serde_json::from_str::<Scored>(r#"{"value":null}"#).is_err());
    }
}
