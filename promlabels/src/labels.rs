use std::{collections::HashMap, fmt, ops::Index};

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use xxhash_rust::xxh64::Xxh64;

/// Name of the label holding the metric name of a series.
pub const METRIC_NAME: &str = "__name__";
/// Name of the label holding the name of the alerting rule an alert
/// instance came from.
pub const ALERT_NAME: &str = "alertname";
/// Name of the histogram bucket upper-bound label.
pub const BUCKET_LABEL: &str = "le";
/// Name of the label holding the scraped instance.
pub const INSTANCE_NAME: &str = "instance";

// Bytes used by the compact encoding and the identity hash. Both are
// invalid anywhere in UTF-8 text, so they cannot occur inside a name or
// value.
const LABEL_SEP: u8 = 0xfe;
const SEP: u8 = 0xff;

/// Label is a key/value pair of strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// `Labels` is a sorted set of `Label`s uniquely identifying a time series
/// or an alert instance.
///
/// A canonical set is sorted ascending by name (byte-wise), has unique
/// names, and is never mutated in place; all edits go through
/// [`Builder`](crate::Builder). Comparison is lexicographic over the
/// sorted (name, value) sequence, so a strict prefix sorts first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Labels(pub(crate) Vec<Label>);

impl Labels {
    /// Sorts the given labels by name. The input is not deduplicated:
    /// externally assembled sequences go through
    /// [`has_duplicate_label_names`](Labels::has_duplicate_label_names)
    /// before they can be trusted.
    pub fn new(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut labels: Vec<Label> = labels.into_iter().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Self(labels)
    }

    /// Builds a label set from an interleaved flat sequence of names and
    /// values. When a name appears more than once the last pair wins, as
    /// if the pairs had been inserted into a map.
    ///
    /// Panics if the number of strings is odd.
    pub fn from_strings<S: AsRef<str>>(pairs: &[S]) -> Self {
        assert!(pairs.len() % 2 == 0, "invalid number of strings");
        Self::from_map(
            pairs
                .chunks_exact(2)
                .map(|pair| (pair[0].as_ref(), pair[1].as_ref())),
        )
    }

    /// Builds a label set from a name to value mapping.
    pub fn from_map<I, S>(m: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut unique = FxHashMap::default();
        for (name, value) in m {
            unique.insert(name.as_ref().to_owned(), value.as_ref().to_owned());
        }
        let mut labels: Vec<Label> = unique
            .into_iter()
            .map(|(name, value)| Label { name, value })
            .collect();
        labels.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Self(labels)
    }

    /// Returns the value of the label with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by_key(&name, |label| label.name.as_str())
            .ok()
            .map(|index| self.0[index].value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }

    /// Returns the label set without any labels that have an empty value,
    /// since an empty value means absence.
    pub fn without_empty(&self) -> Labels {
        if self.0.iter().all(|label| !label.value.is_empty()) {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .filter(|label| !label.value.is_empty())
                .cloned()
                .collect(),
        )
    }

    /// Returns the labels as a name to value mapping.
    pub fn map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|label| (label.name.clone(), label.value.clone()))
            .collect()
    }

    /// Projects the label set by name. With `on == true` only the listed
    /// names are retained. With `on == false` the listed names are
    /// dropped, and so is [`METRIC_NAME`] whether listed or not.
    pub fn match_labels(&self, on: bool, names: &[&str]) -> Labels {
        let name_set: FxHashSet<&str> = names.iter().copied().collect();
        let matched = self
            .0
            .iter()
            .filter(|label| {
                if on {
                    name_set.contains(label.name.as_str())
                } else {
                    label.name != METRIC_NAME && !name_set.contains(label.name.as_str())
                }
            })
            .cloned()
            .collect();
        Self(matched)
    }

    /// Writes the compact byte encoding of the set into `buf`, reusing its
    /// allocation, and returns it. Two sets encode to the same bytes iff
    /// they are equal.
    pub fn bytes(&self, mut buf: Vec<u8>) -> Vec<u8> {
        buf.clear();
        buf.push(LABEL_SEP);
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                buf.push(SEP);
            }
            buf.extend_from_slice(label.name.as_bytes());
            buf.push(SEP);
            buf.extend_from_slice(label.value.as_bytes());
        }
        buf
    }

    /// Like [`bytes`](Labels::bytes), but encodes only the labels whose
    /// names are listed, in set order.
    pub fn bytes_with_labels(&self, buf: Vec<u8>, names: &[&str]) -> Vec<u8> {
        let name_set: FxHashSet<&str> = names.iter().copied().collect();
        self.bytes_filtered(buf, |label| name_set.contains(label.name.as_str()))
    }

    /// Like [`bytes`](Labels::bytes), but encodes only the labels whose
    /// names are not listed.
    pub fn bytes_without_labels(&self, buf: Vec<u8>, names: &[&str]) -> Vec<u8> {
        let name_set: FxHashSet<&str> = names.iter().copied().collect();
        self.bytes_filtered(buf, |label| !name_set.contains(label.name.as_str()))
    }

    fn bytes_filtered(&self, mut buf: Vec<u8>, predicate: impl Fn(&Label) -> bool) -> Vec<u8> {
        buf.clear();
        buf.push(LABEL_SEP);
        for label in &self.0 {
            if !predicate(label) {
                continue;
            }
            if buf.len() > 1 {
                buf.push(SEP);
            }
            buf.extend_from_slice(label.name.as_bytes());
            buf.push(SEP);
            buf.extend_from_slice(label.value.as_bytes());
        }
        buf
    }

    /// Reports the first name that appears on two adjacent entries of the
    /// (possibly non-canonical) sequence, or `None` when all names are
    /// unique. Used to validate externally assembled label sequences.
    pub fn has_duplicate_label_names(&self) -> Option<&str> {
        self.0
            .windows(2)
            .find(|pair| pair[0].name == pair[1].name)
            .map(|pair| pair[0].name.as_str())
    }

    /// Returns the XXH64 hash of the label contents. Equal sets always
    /// hash equally; the hash is a pure function of the sorted name/value
    /// bytes. Values of any size are fed to the hasher incrementally.
    pub fn hash(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        for label in &self.0 {
            hasher.update(label.name.as_bytes());
            hasher.update(&[SEP]);
            hasher.update(label.value.as_bytes());
            hasher.update(&[SEP]);
        }
        hasher.digest()
    }

    /// Hash of only the labels whose names are listed. Matches
    /// [`hash`](Labels::hash) of the projected set.
    pub fn hash_for_labels(&self, names: &[&str]) -> u64 {
        let mut hasher = Xxh64::new(0);
        self.0
            .iter()
            .filter(|label| names.contains(&label.name.as_str()))
            .for_each(|label| {
                hasher.update(label.name.as_bytes());
                hasher.update(&[SEP]);
                hasher.update(label.value.as_bytes());
                hasher.update(&[SEP]);
            });
        hasher.digest()
    }

    /// Hash of the labels whose names are not listed. The metric name is
    /// always left out.
    pub fn hash_without_labels(&self, names: &[&str]) -> u64 {
        let mut hasher = Xxh64::new(0);
        self.0
            .iter()
            .filter(|label| {
                label.name != METRIC_NAME && !names.contains(&label.name.as_str())
            })
            .for_each(|label| {
                hasher.update(label.name.as_bytes());
                hasher.update(&[SEP]);
                hasher.update(label.value.as_bytes());
                hasher.update(&[SEP]);
            });
        hasher.digest()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.0
                .iter()
                .map(|label| format!("{}={:?}", label.name, label.value))
                .join(", ")
        )
    }
}

impl Index<&str> for Labels {
    type Output = str;

    fn index(&self, name: &str) -> &Self::Output {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no label found for name {name:?}"),
        }
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
