use rustc_hash::{FxHashMap, FxHashSet};

use crate::labels::{Label, Labels};

/// `Builder` stages edits against a base label set and materializes a new
/// canonical [`Labels`] on demand.
///
/// It is the only mutation path for label sets: the base is never touched,
/// and [`labels`](Builder::labels) produces the same result as building
/// the edited set from scratch. A builder is a single-owner object for one
/// logical edit session; materializing does not consume it, so it can be
/// edited further and materialized again.
#[derive(Debug, Default)]
pub struct Builder {
    base: Labels,
    set: FxHashMap<String, String>,
    del: FxHashSet<String>,
    keep: Option<FxHashSet<String>>,
}

impl Builder {
    pub fn new(base: Labels) -> Self {
        let mut builder = Self::default();
        builder.reset(base);
        builder
    }

    /// Drops all staged edits and starts a new session over `base`. Base
    /// entries with an empty value are staged for deletion right away,
    /// since an empty value means absence.
    pub fn reset(&mut self, base: Labels) {
        self.set.clear();
        self.del.clear();
        self.keep = None;
        for label in base.iter() {
            if label.value.is_empty() {
                self.del.insert(label.name.clone());
            }
        }
        self.base = base;
    }

    /// Stages `name = value`, adding the label or overwriting the base
    /// value. An empty value stages a deletion instead. For any one name
    /// the last `set`/`del` call of the session wins.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.set.remove(name);
            self.del.insert(name.to_owned());
        } else {
            self.del.remove(name);
            self.set.insert(name.to_owned(), value.to_owned());
        }
        self
    }

    /// Stages deletion of each listed name, overriding any prior `set`
    /// for that name.
    pub fn del(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.set.remove(*name);
            self.del.insert((*name).to_owned());
        }
        self
    }

    /// Installs an allow-list: the materialized result retains only the
    /// listed names. The filter is applied last, after all sets and
    /// deletes; a repeated call replaces the list.
    pub fn keep(&mut self, names: &[&str]) -> &mut Self {
        self.keep = Some(names.iter().map(|name| (*name).to_owned()).collect());
        self
    }

    /// Materializes the canonical result of the staged edits: the base
    /// minus deletions, overlaid with staged values, filtered by the
    /// allow-list, re-sorted. The output is sorted, has unique names, and
    /// holds no empty values.
    pub fn labels(&self) -> Labels {
        let mut result: Vec<Label> = Vec::with_capacity(self.base.len() + self.set.len());
        for label in self.base.iter() {
            if self.del.contains(&label.name) || self.set.contains_key(&label.name) {
                continue;
            }
            result.push(label.clone());
        }
        for (name, value) in &self.set {
            result.push(Label::new(name.clone(), value.clone()));
        }
        if let Some(keep) = &self.keep {
            result.retain(|label| keep.contains(&label.name));
        }
        result.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Labels(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Labels {
        Labels::from_strings(&["aaa", "111", "bbb", "222", "ccc", "333"])
    }

    #[test]
    fn test_noop() {
        let builder = Builder::new(Labels::from_strings(&["aaa", "111"]));
        assert_eq!(builder.labels(), Labels::from_strings(&["aaa", "111"]));
    }

    #[test]
    fn test_del() {
        let mut builder = Builder::new(base());
        builder.del(&["bbb"]);
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333"])
        );
    }

    #[test]
    fn test_set_on_empty_base() {
        let mut builder = Builder::new(Labels::default());
        builder
            .set("aaa", "111")
            .set("bbb", "222")
            .set("ccc", "333")
            .del(&["bbb"]);
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333"])
        );
    }

    #[test]
    fn test_set_adds_and_overwrites() {
        let mut builder = Builder::new(Labels::from_strings(&["aaa", "111"]));
        builder.set("bbb", "222");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "bbb", "222"])
        );

        // Last set of a session wins.
        builder.set("bbb", "333");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "bbb", "333"])
        );
    }

    #[test]
    fn test_del_and_set() {
        let mut builder = Builder::new(base());
        builder.del(&["bbb"]).set("ddd", "444");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333", "ddd", "444"])
        );
    }

    #[test]
    fn test_del_wins_over_earlier_set() {
        let mut builder = Builder::new(base());
        builder.set("ddd", "444").del(&["ddd"]);
        assert_eq!(builder.labels(), base());
    }

    #[test]
    fn test_set_resurrects_deleted() {
        let mut builder = Builder::new(base());
        builder.del(&["bbb"]).set("bbb", "999");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "bbb", "999", "ccc", "333"])
        );
    }

    #[test]
    fn test_blank_base_value() {
        let builder = Builder::new(Labels::from_strings(&["aaa", "111", "bbb", "", "ccc", "333"]));
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333"])
        );
    }

    #[test]
    fn test_set_blank_deletes() {
        let mut builder = Builder::new(base());
        builder.set("bbb", "");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333"])
        );
    }

    #[test]
    fn test_keep() {
        let mut builder = Builder::new(base());
        builder.keep(&["bbb"]);
        assert_eq!(builder.labels(), Labels::from_strings(&["bbb", "222"]));

        let mut builder = Builder::new(base());
        builder.keep(&["aaa", "ccc"]);
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ccc", "333"])
        );
    }

    #[test]
    fn test_keep_filters_last() {
        let mut builder = Builder::new(base());
        builder.del(&["bbb"]).set("ddd", "444").keep(&["aaa", "ddd"]);
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "ddd", "444"])
        );
    }

    #[test]
    fn test_reuse_after_materialize() {
        let mut builder = Builder::new(base());
        builder.del(&["ccc"]);
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "bbb", "222"])
        );

        // The builder stays live; further edits stack on the same session.
        builder.set("ddd", "444");
        assert_eq!(
            builder.labels(),
            Labels::from_strings(&["aaa", "111", "bbb", "222", "ddd", "444"])
        );
    }

    #[test]
    fn test_reset() {
        let mut builder = Builder::new(base());
        builder.del(&["aaa"]).set("ddd", "444").keep(&["ddd"]);
        builder.reset(Labels::from_strings(&["xxx", "777"]));
        assert_eq!(builder.labels(), Labels::from_strings(&["xxx", "777"]));
    }

    #[test]
    fn test_materialization_is_canonical() {
        let mut builder = Builder::new(Labels::from_strings(&["bbb", "", "aaa", "111"]));
        builder.set("ccc", "333").set("ddd", "").del(&["zzz"]);
        let labels = builder.labels();
        assert_eq!(labels.has_duplicate_label_names(), None);
        assert!(labels.iter().all(|label| !label.value.is_empty()));
        assert_eq!(labels, Labels::from_strings(&["aaa", "111", "ccc", "333"]));
    }
}
