//! Lossless JSON encoding for `f64`.
//!
//! JSON numbers cannot hold infinities or NaN (`serde_json` writes them as
//! `null`, which does not read back). Non-finite values are written as the
//! strings `"inf"`, `"-inf"` and `"nan"` instead.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct Lossless(f64);

impl Serialize for Lossless {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str("nan")
        } else if v > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }
}

impl<'de> Deserialize<'de> for Lossless {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Lossless(v)),
            Repr::Text(t) => match t.as_str() {
                "inf" => Ok(Lossless(f64::INFINITY)),
                "-inf" => Ok(Lossless(f64::NEG_INFINITY)),
                "nan" => Ok(Lossless(f64::NAN)),
                other => Err(D::Error::custom(format!("invalid float literal `{other}`"))),
            },
        }
    }
}

pub(crate) mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Lossless(*v).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Lossless::deserialize(deserializer).map(|l| l.0)
    }
}

pub(crate) mod seq {
    use super::*;

    pub fn serialize<S: Serializer>(v: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(v.iter().map(|&x| Lossless(x)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw = Vec::<Lossless>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|l| l.0).collect())
    }
}

pub(crate) mod opt_seq {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(values) => {
                let encoded: Vec<Lossless> = values.iter().map(|&x| Lossless(x)).collect();
                serializer.serialize_some(&encoded)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<f64>>, D::Error> {
        let raw = Option::<Vec<Lossless>>::deserialize(deserializer)?;
        Ok(raw.map(|values| values.into_iter().map(|l| l.0).collect()))
    }
}

pub(crate) mod opt_scalar {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(x) => serializer.serialize_some(&Lossless(*x)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Lossless>::deserialize(deserializer)?.map(|l| l.0))
    }
}

pub(crate) mod map {
    use super::*;

    pub fn serialize<S: Serializer>(
        v: &BTreeMap<String, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(v.iter().map(|(k, &x)| (k, Lossless(x))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, f64>, D::Error> {
        let raw = BTreeMap::<String, Lossless>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, l)| (k, l.0)).collect())
    }
}
