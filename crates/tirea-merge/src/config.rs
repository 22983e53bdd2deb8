//! Per-path overrides and engine options.
//!
//! [`PatchConfig`] is a small list of entries built by the caller, usually
//! once per request type. Entries are matched against the full path of a
//! mutation either exactly or by a prefix/suffix range; the range form lets
//! one override apply to the same member of every element reconciled inside
//! a collection. Lookup is a linear scan in insertion order.

use crate::{MergeError, MergeObject, MergeResult, Path};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Custom assignment: `(original owner, patch owner)` of the matched member.
pub type SetAction =
    Arc<dyn Fn(&mut dyn MergeObject, &dyn MergeObject) -> MergeResult<()> + Send + Sync>;

/// Builds a fresh original-side element from a patch-side element.
pub type ItemFactory =
    Arc<dyn Fn(&dyn MergeObject) -> MergeResult<Box<dyn MergeObject>> + Send + Sync>;

/// How an entry selects paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathMatcher {
    /// Case-insensitive equality with the full path.
    Exact(Path),
    /// The full path starts with `prefix` and ends with `suffix`.
    Range {
        /// Leading segments, usually a collection path.
        prefix: Path,
        /// Trailing segments, usually a member of the element type.
        suffix: Path,
    },
}

impl PathMatcher {
    /// Check whether `full_path` is selected.
    pub fn matches(&self, full_path: &Path) -> bool {
        match self {
            PathMatcher::Exact(path) => full_path.eq_ignore_case(path),
            PathMatcher::Range { prefix, suffix } => {
                full_path.len() >= prefix.len() + suffix.len()
                    && full_path.starts_with_ignore_case(prefix)
                    && full_path.ends_with_ignore_case(suffix)
            }
        }
    }

    fn anchor(&self) -> Path {
        match self {
            PathMatcher::Exact(path) => path.clone(),
            PathMatcher::Range { prefix, suffix } => prefix.join(suffix),
        }
    }
}

/// What a matched entry does.
#[derive(Clone)]
pub enum ConfigAction {
    /// Replace plain assignment of a leaf.
    Set(SetAction),
    /// Build new collection elements.
    Factory(ItemFactory),
    /// Replace the collection as a whole instead of reconciling by identity.
    ForceReplace,
}

impl fmt::Debug for ConfigAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigAction::Set(_) => f.write_str("Set(..)"),
            ConfigAction::Factory(_) => f.write_str("Factory(..)"),
            ConfigAction::ForceReplace => f.write_str("ForceReplace"),
        }
    }
}

/// One override.
#[derive(Clone, Debug)]
pub struct ConfigEntry {
    /// Which paths the entry applies to.
    pub matcher: PathMatcher,
    /// What it does there.
    pub action: ConfigAction,
}

/// Caller-declared overrides, resolved by path.
///
/// # Examples
///
/// ```
/// use tirea_merge::{PatchConfig, Path};
///
/// let config = PatchConfig::new().force_replace("Tags");
/// assert!(config.forces_replace(&Path::parse("tags")));
/// assert!(!config.forces_replace(&Path::parse("Labels")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PatchConfig {
    entries: Vec<ConfigEntry>,
}

impl PatchConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw entry.
    pub fn with_entry(mut self, entry: ConfigEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Override assignment at exactly `path`.
    pub fn set<F>(self, path: impl Into<Path>, action: F) -> Self
    where
        F: Fn(&mut dyn MergeObject, &dyn MergeObject) -> MergeResult<()> + Send + Sync + 'static,
    {
        self.with_entry(ConfigEntry {
            matcher: PathMatcher::Exact(path.into()),
            action: ConfigAction::Set(Arc::new(action)),
        })
    }

    /// Override assignment for every path starting with `prefix` and ending
    /// with `suffix`.
    pub fn set_in_range<F>(self, prefix: impl Into<Path>, suffix: impl Into<Path>, action: F) -> Self
    where
        F: Fn(&mut dyn MergeObject, &dyn MergeObject) -> MergeResult<()> + Send + Sync + 'static,
    {
        self.with_entry(ConfigEntry {
            matcher: PathMatcher::Range {
                prefix: prefix.into(),
                suffix: suffix.into(),
            },
            action: ConfigAction::Set(Arc::new(action)),
        })
    }

    /// Typed form of [`set`](Self::set); `O` and `P` are the owners of the
    /// member on the original and patch side.
    pub fn set_with<O, P, F>(self, path: impl Into<Path>, action: F) -> Self
    where
        O: MergeObject,
        P: MergeObject,
        F: Fn(&mut O, &P) + Send + Sync + 'static,
    {
        let matcher = PathMatcher::Exact(path.into());
        let action = typed_set_action(matcher.anchor(), action);
        self.with_entry(ConfigEntry {
            matcher,
            action: ConfigAction::Set(action),
        })
    }

    /// Typed form of [`set_in_range`](Self::set_in_range).
    pub fn set_in_range_with<O, P, F>(
        self,
        prefix: impl Into<Path>,
        suffix: impl Into<Path>,
        action: F,
    ) -> Self
    where
        O: MergeObject,
        P: MergeObject,
        F: Fn(&mut O, &P) + Send + Sync + 'static,
    {
        let matcher = PathMatcher::Range {
            prefix: prefix.into(),
            suffix: suffix.into(),
        };
        let action = typed_set_action(matcher.anchor(), action);
        self.with_entry(ConfigEntry {
            matcher,
            action: ConfigAction::Set(action),
        })
    }

    /// Build new elements of the collection at `path` with `factory`.
    pub fn factory<F>(self, path: impl Into<Path>, factory: F) -> Self
    where
        F: Fn(&dyn MergeObject) -> MergeResult<Box<dyn MergeObject>> + Send + Sync + 'static,
    {
        self.with_entry(ConfigEntry {
            matcher: PathMatcher::Exact(path.into()),
            action: ConfigAction::Factory(Arc::new(factory)),
        })
    }

    /// Typed form of [`factory`](Self::factory): build an original-side `O`
    /// from a patch-side `P`.
    pub fn factory_with<O, P, F>(self, path: impl Into<Path>, factory: F) -> Self
    where
        O: MergeObject,
        P: MergeObject,
        F: Fn(&P) -> O + Send + Sync + 'static,
    {
        let path: Path = path.into();
        let anchor = path.clone();
        self.factory(path, move |patch_item: &dyn MergeObject| {
            let patch_item = patch_item.downcast_ref::<P>().ok_or_else(|| {
                MergeError::configuration(
                    anchor.clone(),
                    format!(
                        "factory expects `{}`, got `{}`",
                        std::any::type_name::<P>(),
                        patch_item.type_name()
                    ),
                )
            })?;
            Ok(Box::new(factory(patch_item)) as Box<dyn MergeObject>)
        })
    }

    /// Replace the collection at `path` instead of reconciling by identity.
    pub fn force_replace(self, path: impl Into<Path>) -> Self {
        self.with_entry(ConfigEntry {
            matcher: PathMatcher::Exact(path.into()),
            action: ConfigAction::ForceReplace,
        })
    }

    /// The first custom assignment matching `full_path`.
    pub fn set_action(&self, full_path: &Path) -> Option<&SetAction> {
        self.entries.iter().find_map(|entry| match &entry.action {
            ConfigAction::Set(action) if entry.matcher.matches(full_path) => Some(action),
            _ => None,
        })
    }

    /// The first element factory matching `full_path`.
    pub fn item_factory(&self, full_path: &Path) -> Option<&ItemFactory> {
        self.entries.iter().find_map(|entry| match &entry.action {
            ConfigAction::Factory(factory) if entry.matcher.matches(full_path) => Some(factory),
            _ => None,
        })
    }

    /// Whether the collection at `full_path` is replaced as a whole.
    pub fn forces_replace(&self, full_path: &Path) -> bool {
        self.entries.iter().any(|entry| {
            matches!(entry.action, ConfigAction::ForceReplace) && entry.matcher.matches(full_path)
        })
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn typed_set_action<O, P, F>(anchor: Path, action: F) -> SetAction
where
    O: MergeObject,
    P: MergeObject,
    F: Fn(&mut O, &P) + Send + Sync + 'static,
{
    Arc::new(move |original: &mut dyn MergeObject, patch: &dyn MergeObject| {
        let found = original.type_name();
        let original = original.downcast_mut::<O>().ok_or_else(|| {
            MergeError::configuration(
                anchor.clone(),
                format!(
                    "override expects original `{}`, got `{found}`",
                    std::any::type_name::<O>()
                ),
            )
        })?;
        let patch = patch.downcast_ref::<P>().ok_or_else(|| {
            MergeError::configuration(
                anchor.clone(),
                format!(
                    "override expects patch `{}`, got `{}`",
                    std::any::type_name::<P>(),
                    patch.type_name()
                ),
            )
        })?;
        action(original, patch);
        Ok(())
    })
}

fn default_remove_marker() -> String {
    "remove".to_string()
}

fn default_ignore_case() -> bool {
    true
}

/// Engine options.
///
/// Deserializable from any serde format; missing keys take their defaults.
///
/// ```
/// use tirea_merge::MergeOptions;
///
/// let options: MergeOptions = serde_json::from_str(r#"{"remove_marker": "_delete"}"#).unwrap();
/// assert_eq!(options.remove_marker, "_delete");
/// assert!(options.ignore_case);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Name of the element key that requests removal when set to `true`.
    /// Matched case-insensitively; never applied as a member.
    #[serde(default = "default_remove_marker")]
    pub remove_marker: String,
    /// Resolve member names case-insensitively when no exact match exists.
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            remove_marker: default_remove_marker(),
            ignore_case: default_ignore_case(),
        }
    }
}

impl MergeOptions {
    /// Check whether `key` is the removal marker.
    #[inline]
    pub fn is_remove_marker(&self, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.remove_marker)
    }
}
