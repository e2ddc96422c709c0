//! Serde adapters for HTTP types used in fixture files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod status {
    use super::*;
    use hyper::StatusCode;

    pub fn serialize<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(d)?;
        StatusCode::from_u16(code).map_err(serde::de::Error::custom)
    }
}

/// Bodies are written as UTF-8 strings; non-UTF-8 bytes serialize lossily.
pub mod body {
    use super::*;
    use bytes::Bytes;

    pub fn serialize<S: Serializer>(body: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&String::from_utf8_lossy(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        Ok(Bytes::from(String::deserialize(d)?))
    }
}

/// Headers are a map of name to a single value or a list of values.
pub mod headers {
    use super::*;
    use hyper::header::{HeaderName, HeaderValue};
    use hyper::HeaderMap;
    use serde::de::{Error, MapAccess, Visitor};
    use std::collections::BTreeMap;
    use std::fmt;

    #[derive(Deserialize, Serialize)]
    #[serde(untagged)]
    enum Values {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(headers: &HeaderMap, s: S) -> Result<S::Ok, S::Error> {
        let mut out: BTreeMap<&str, Values> = BTreeMap::new();
        for name in headers.keys() {
            let mut values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            let entry = if values.len() == 1 {
                Values::One(values.remove(0))
            } else {
                Values::Many(values)
            };
            out.insert(name.as_str(), entry);
        }
        out.serialize(s)
    }

    /// Entries are applied in document order, so when a name repeats with
    /// different case the later entry replaces the earlier one.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<HeaderMap, D::Error> {
        d.deserialize_map(HeaderMapVisitor)
    }

    struct HeaderMapVisitor;

    impl<'de> Visitor<'de> for HeaderMapVisitor {
        type Value = HeaderMap;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of header names to a value or list of values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<HeaderMap, A::Error> {
            let mut headers = HeaderMap::new();
            while let Some((name, values)) = access.next_entry::<String, Values>()? {
                let name = HeaderName::try_from(name.as_str()).map_err(A::Error::custom)?;
                let values = match values {
                    Values::One(v) => vec![v],
                    Values::Many(vs) => vs,
                };
                headers.remove(&name);
                for value in values {
                    let value = HeaderValue::try_from(value).map_err(A::Error::custom)?;
                    headers.append(name.clone(), value);
                }
            }
            Ok(headers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::HeaderMap;

    #[derive(Deserialize)]
    struct Fixture {
        #[serde(with = "headers")]
        headers: HeaderMap,
    }

    #[test]
    fn test_repeated_header_name_keeps_last_written() {
        let fixture: Fixture =
            serde_yaml::from_str("headers:\n  content-type: first\n  Content-Type: last\n").unwrap();
        assert_eq!(fixture.headers.len(), 1);
        assert_eq!(fixture.headers.get("content-type").unwrap(), "last");

        let fixture: Fixture =
            serde_json::from_str(r#"{"headers": {"X-Tag": "b", "x-tag": ["c", "d"]}}"#).unwrap();
        let values: Vec<_> = fixture.headers.get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["c", "d"]);
    }
}
