use super::record::CheckpointRecord;
use crate::Error;
use crate::Result;
use crate::WinrateMatrix;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Append-only results of one run.
///
/// `records.jsonl` is the commit point: a checkpoint exists once its line
/// is synced. The CSV tables are derived from it and rewritten atomically
/// after every append, so a crash leaves them either before or after the
/// checkpoint, never torn.
#[derive(Debug)]
pub struct ResultStore {
    root: PathBuf,
    records: Vec<CheckpointRecord>,
}

impl ResultStore {
    pub const RECORDS: &'static str = "records.jsonl";
    pub const NASH: &'static str = "evolution_maxent_nash.csv";
    pub const RATINGS: &'static str = "evolution_nash_averaging.csv";
    pub const MATRICES: &'static str = "winrate_matrices.json";
    pub const FINAL: &'static str = "final_matrix.json";

    /// Start a new store. Refuses to adopt an existing record log.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(Error::io("create", &root))?;
        let path = root.join(Self::RECORDS);
        if path.exists() {
            return Err(Error::PathCollision(path));
        }
        Ok(Self {
            root,
            records: Vec::new(),
        })
    }

    /// Resume a store, dropping an unterminated final line left by a crash.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(Error::io("create", &root))?;
        let path = root.join(Self::RECORDS);
        let records = match path.exists() {
            false => Vec::new(),
            true => {
                let (records, committed) = Self::parse(&path)?;
                std::fs::OpenOptions::new()
                    .write(true)
                    .open(&path)
                    .and_then(|file| file.set_len(committed))
                    .map_err(Error::io("truncate", &path))?;
                records
            }
        };
        log::debug!("opened {} with {} records", root.display(), records.len());
        Ok(Self { root, records })
    }

    /// Every committed record under `root`, in iteration order.
    pub fn read(root: impl AsRef<Path>) -> Result<Vec<CheckpointRecord>> {
        Self::parse(&root.as_ref().join(Self::RECORDS)).map(|(records, _)| records)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
    pub fn records(&self) -> &[CheckpointRecord] {
        &self.records
    }

    /// Commit one checkpoint, then refresh the derived tables.
    pub fn append(&mut self, record: CheckpointRecord) -> Result<()> {
        if let Some(last) = self.records.last() {
            if record.iteration <= last.iteration {
                return Err(Error::RecordOrder {
                    iteration: record.iteration,
                    previous: last.iteration,
                });
            }
        }
        let ref path = self.root.join(Self::RECORDS);
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(Error::io("open", path))?;
        file.write_all(&line).map_err(Error::io("append to", path))?;
        file.sync_all().map_err(Error::io("sync", path))?;
        self.records.push(record);
        self.tabulate()
    }

    /// Write the iteration → submatrix map and the final matrix.
    pub fn finish(&self, matrix: &WinrateMatrix) -> Result<()> {
        let matrices = self
            .records
            .iter()
            .map(|record| (record.iteration, &record.winrate))
            .collect::<BTreeMap<_, _>>();
        Self::replace(
            &self.root.join(Self::MATRICES),
            &serde_json::to_vec_pretty(&matrices)?,
        )?;
        Self::replace(
            &self.root.join(Self::FINAL),
            &serde_json::to_vec_pretty(matrix)?,
        )?;
        log::info!("results finalized in {}", self.root.display());
        Ok(())
    }

    /// Records plus the byte length of the committed prefix.
    fn parse(path: &Path) -> Result<(Vec<CheckpointRecord>, u64)> {
        let contents = std::fs::read_to_string(path).map_err(Error::io("read", path))?;
        let mut records = Vec::<CheckpointRecord>::new();
        let mut committed = 0;
        for (index, line) in contents.split_inclusive('\n').enumerate() {
            if !line.ends_with('\n') {
                log::warn!("ignoring unterminated record at line {} of {}", index + 1, path.display());
                break;
            }
            committed += line.len() as u64;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<CheckpointRecord>(line).map_err(|source| Error::CorruptRecord {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
            if let Some(last) = records.last() {
                if record.iteration <= last.iteration {
                    return Err(Error::RecordOrder {
                        iteration: record.iteration,
                        previous: last.iteration,
                    });
                }
            }
            records.push(record);
        }
        Ok((records, committed))
    }

    fn tabulate(&self) -> Result<()> {
        let nash = self.table(|record| record.nash.weights().to_vec());
        let ratings = self.table(|record| record.ratings.clone());
        Self::replace(&self.root.join(Self::NASH), nash.as_bytes())?;
        Self::replace(&self.root.join(Self::RATINGS), ratings.as_bytes())?;
        Ok(())
    }

    /// One row per checkpoint, one column per slot; slots that did not
    /// exist yet are zero.
    fn table<F>(&self, values: F) -> String
    where
        F: Fn(&CheckpointRecord) -> Vec<f64>,
    {
        let width = self.records.iter().map(CheckpointRecord::size).max().unwrap_or(0);
        let header = std::iter::once("iteration".to_string())
            .chain((0..width).map(|slot| slot.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.records
            .iter()
            .map(|record| {
                let mut row = values(record);
                row.resize(width, 0.0);
                std::iter::once(record.iteration.to_string())
                    .chain(row.iter().map(|value| value.to_string()))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .fold(header + "\n", |table, row| table + &row + "\n")
    }

    /// Replace `path` with `bytes` through a synced sibling temp file.
    fn replace(path: &Path, bytes: &[u8]) -> Result<()> {
        let ref temp = path.with_extension("tmp");
        let mut file = std::fs::File::create(temp).map_err(Error::io("create", temp))?;
        file.write_all(bytes).map_err(Error::io("write", temp))?;
        file.sync_all().map_err(Error::io("sync", temp))?;
        std::fs::rename(temp, path).map_err(Error::io("rename", temp))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Iteration;
    use crate::NashSolver;

    fn record(iteration: Iteration, matrix: WinrateMatrix) -> CheckpointRecord {
        let equilibrium = NashSolver::default().solve(&matrix);
        CheckpointRecord::from((iteration, matrix, &equilibrium))
    }

    fn records() -> Vec<CheckpointRecord> {
        let mut matrix = WinrateMatrix::new(1);
        let first = record(0, matrix.clone());
        matrix.grow();
        let second = record(10, matrix.clone());
        matrix.grow();
        matrix.set(0, 2, 1.0);
        matrix.set(1, 2, 1.0);
        let third = record(20, matrix);
        vec![first, second, third]
    }

    #[test]
    fn appended_records_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        for record in records() {
            store.append(record).unwrap();
        }
        assert_eq!(ResultStore::read(dir.path()).unwrap(), records());
        assert_eq!(store.records().len(), 3);
    }

    #[test]
    fn tables_pad_missing_slots_with_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        let [first, second, _] = <[CheckpointRecord; 3]>::try_from(records()).unwrap();
        store.append(first).unwrap();
        store.append(second).unwrap();
        let nash = std::fs::read_to_string(dir.path().join(ResultStore::NASH)).unwrap();
        assert_eq!(nash, "iteration,0,1\n0,1,0\n10,0.5,0.5\n");
        let ratings = std::fs::read_to_string(dir.path().join(ResultStore::RATINGS)).unwrap();
        assert_eq!(ratings, "iteration,0,1\n0,0,0\n10,0,0\n");
    }

    #[test]
    fn rejects_out_of_order_iterations() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        store.append(record(10, WinrateMatrix::new(1))).unwrap();
        let error = store.append(record(10, WinrateMatrix::new(1))).unwrap_err();
        assert!(matches!(error, Error::RecordOrder { iteration: 10, previous: 10 }));
        assert_eq!(ResultStore::read(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn survives_a_torn_final_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        let [first, second, third] = <[CheckpointRecord; 3]>::try_from(records()).unwrap();
        store.append(first).unwrap();
        store.append(second).unwrap();
        let path = dir.path().join(ResultStore::RECORDS);
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"iteration\":20,\"winr").unwrap();
        drop(file);
        assert_eq!(ResultStore::read(dir.path()).unwrap().len(), 2);
        let mut store = ResultStore::open(dir.path()).unwrap();
        assert_eq!(store.records().len(), 2);
        store.append(third).unwrap();
        assert_eq!(ResultStore::read(dir.path()).unwrap(), records());
    }

    #[test]
    fn corrupt_committed_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ResultStore::RECORDS), "not json\n").unwrap();
        assert!(matches!(
            ResultStore::read(dir.path()),
            Err(Error::CorruptRecord { line: 1, .. })
        ));
    }

    #[test]
    fn create_refuses_an_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        store.append(record(0, WinrateMatrix::new(1))).unwrap();
        assert!(matches!(ResultStore::create(dir.path()), Err(Error::PathCollision(_))));
    }

    #[test]
    fn finish_writes_matrices() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::create(dir.path()).unwrap();
        let all = records();
        let last = all[2].winrate.clone();
        for record in all {
            store.append(record).unwrap();
        }
        store.finish(&last).unwrap();
        let text = std::fs::read_to_string(dir.path().join(ResultStore::FINAL)).unwrap();
        assert_eq!(serde_json::from_str::<WinrateMatrix>(&text).unwrap(), last);
        let text = std::fs::read_to_string(dir.path().join(ResultStore::MATRICES)).unwrap();
        let matrices = serde_json::from_str::<BTreeMap<Iteration, WinrateMatrix>>(&text).unwrap();
        assert_eq!(matrices.keys().copied().collect::<Vec<_>>(), vec![0, 10, 20]);
        assert_eq!(matrices[&10], WinrateMatrix::new(2));
    }
}
