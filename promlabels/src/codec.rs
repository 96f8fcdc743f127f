use std::fmt;

use rustc_hash::FxHashMap;
use serde::{
    de::{MapAccess, Visitor},
    ser::{SerializeMap, Serializer},
    Deserialize, Deserializer, Serialize,
};

use crate::labels::{Label, Labels};

impl Serialize for Labels {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for label in self.iter() {
            map.serialize_entry(&label.name, &label.value)?;
        }
        map.end()
    }
}

struct LabelsVisitor;

impl<'de> Visitor<'de> for LabelsVisitor {
    type Value = Labels;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of label names to label values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Duplicate keys in the input resolve last-writer-wins, the same
        // as map-based construction.
        let mut unique = FxHashMap::default();
        while let Some((name, value)) = access.next_entry::<String, String>()? {
            unique.insert(name, value);
        }
        let mut labels: Vec<Label> = unique
            .into_iter()
            .map(|(name, value)| Label { name, value })
            .collect();
        labels.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(Labels(labels))
    }
}

impl<'de> Deserialize<'de> for Labels {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(LabelsVisitor)
    }
}
