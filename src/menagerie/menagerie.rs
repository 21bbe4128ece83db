use super::codec::Codec;
use super::codec::Metadata;
use super::entry::Entry;
use crate::Environment;
use crate::Error;
use crate::Frozen;
use crate::Iteration;
use crate::Result;
use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;

/// Append-only arena of frozen snapshots, indexed by insertion slot.
///
/// Slots are never removed or reordered, and iterations strictly increase
/// with the slot index. Every admitted snapshot is persisted before it
/// becomes visible.
pub struct Menagerie<E, S>
where
    E: Environment,
    S: Frozen<E>,
{
    root: PathBuf,
    scheme: String,
    entries: Vec<Entry<S>>,
    phantom: PhantomData<fn() -> E>,
}

impl<E, S> Menagerie<E, S>
where
    E: Environment,
    S: Frozen<E>,
{
    /// Empty menagerie persisting into `root`, tagging snapshots with `scheme`.
    pub fn new(root: impl Into<PathBuf>, scheme: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            scheme: scheme.into(),
            entries: Vec::new(),
            phantom: PhantomData,
        }
    }

    /// Persist `snapshot` and append it. Returns the new slot.
    pub fn admit(&mut self, iteration: Iteration, snapshot: S) -> Result<usize> {
        self.check(iteration)?;
        std::fs::create_dir_all(&self.root).map_err(Error::io("create", &self.root))?;
        let path = Codec::path(&self.root, iteration);
        let metadata = Metadata {
            iteration,
            scheme: self.scheme.clone(),
        };
        Codec::save(&path, &metadata, &snapshot.parameters())?;
        self.push(iteration, snapshot, path)
    }

    /// Append an already persisted snapshot. Returns the new slot.
    pub fn push(&mut self, iteration: Iteration, snapshot: S, path: PathBuf) -> Result<usize> {
        self.check(iteration)?;
        self.entries.push(Entry::new(iteration, snapshot, path));
        Ok(self.entries.len() - 1)
    }

    /// Rebuild a menagerie from snapshot files previously written to `root`.
    pub fn restore(root: impl Into<PathBuf>, scheme: impl Into<String>) -> Result<Self> {
        let mut menagerie = Self::new(root, scheme);
        let ref root = menagerie.root.clone();
        let mut paths = std::fs::read_dir(root)
            .map_err(Error::io("list", root))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "snapshot"))
            .collect::<Vec<_>>();
        paths.sort();
        let mut loaded = paths
            .into_iter()
            .map(|path| Codec::load::<E, S>(&path).map(|(metadata, snapshot)| (metadata.iteration, snapshot, path)))
            .collect::<Result<Vec<_>>>()?;
        loaded.sort_by_key(|(iteration, _, _)| *iteration);
        for (iteration, snapshot, path) in loaded {
            menagerie.push(iteration, snapshot, path)?;
        }
        Ok(menagerie)
    }

    fn check(&self, iteration: Iteration) -> Result<()> {
        match self.entries.last() {
            Some(last) if last.iteration() >= iteration => Err(Error::Unordered {
                iteration,
                previous: last.iteration(),
            }),
            _ => Ok(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn get(&self, slot: usize) -> Option<&Entry<S>> {
        self.entries.get(slot)
    }
    pub fn latest(&self) -> Option<&Entry<S>> {
        self.entries.last()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Entry<S>> {
        self.entries.iter()
    }
    /// Snapshots at the given slots, in the given order.
    pub fn snapshots(&self, slots: &[usize]) -> Vec<&S> {
        slots
            .iter()
            .filter_map(|slot| self.get(*slot))
            .map(Entry::snapshot)
            .collect()
    }
}
