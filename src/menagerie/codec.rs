use crate::Environment;
use crate::Error;
use crate::Frozen;
use crate::Iteration;
use crate::Parameter;
use crate::Result;
use byteorder::BE;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Metadata stored alongside snapshot parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub iteration: Iteration,
    pub scheme: String,
}

/// Binary snapshot format.
///
/// ```text
/// magic      8 bytes  "NASHSNAP"
/// version    u16
/// iteration  u64
/// scheme     u16 length + UTF-8 bytes
/// count      u64
/// parameters count × f64
/// ```
///
/// All integers and floats are big-endian.
pub struct Codec;

impl Codec {
    const MAGIC: &'static [u8; 8] = b"NASHSNAP";
    const VERSION: u16 = 1;

    /// Deterministic location of the snapshot frozen at `iteration`.
    pub fn path(root: &Path, iteration: Iteration) -> PathBuf {
        root.join(format!("{:08}_iterations.snapshot", iteration))
    }

    /// Write parameters and metadata. Never overwrites an existing file;
    /// the final path only appears once the contents are synced.
    pub fn save(path: &Path, metadata: &Metadata, parameters: &[Parameter]) -> Result<()> {
        let scheme = metadata.scheme.as_bytes();
        if scheme.len() > u16::MAX as usize {
            return Err(Error::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: format!("scheme name of {} bytes", scheme.len()),
            });
        }
        let ref temp = path.with_extension("snapshot.tmp");
        let file = File::create(temp).map_err(Error::io("create", temp))?;
        let mut writer = BufWriter::new(file);
        Self::write(&mut writer, metadata.iteration, scheme, parameters)
            .map_err(Error::io("write", temp))?;
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .map_err(Error::io("sync", temp))?;
        // never replaces an existing target
        let linked = std::fs::hard_link(temp, path);
        std::fs::remove_file(temp).map_err(Error::io("remove", temp))?;
        match linked {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(Error::PathCollision(path.to_path_buf())),
            other => other.map_err(Error::io("link", path))?,
        }
        log::debug!("saved snapshot {} ({} parameters)", path.display(), parameters.len());
        Ok(())
    }

    fn write<W>(writer: &mut W, iteration: Iteration, scheme: &[u8], parameters: &[Parameter]) -> std::io::Result<()>
    where
        W: Write,
    {
        writer.write_all(Self::MAGIC)?;
        writer.write_u16::<BE>(Self::VERSION)?;
        writer.write_u64::<BE>(iteration)?;
        writer.write_u16::<BE>(scheme.len() as u16)?;
        writer.write_all(scheme)?;
        writer.write_u64::<BE>(parameters.len() as u64)?;
        for parameter in parameters {
            writer.write_f64::<BE>(*parameter)?;
        }
        writer.flush()
    }

    /// Read raw metadata and parameters.
    pub fn read(path: &Path) -> Result<(Metadata, Vec<Parameter>)> {
        let file = File::open(path).map_err(Error::io("open", path))?;
        let size = file.metadata().map_err(Error::io("stat", path))?.len();
        let ref mut reader = BufReader::new(file);
        let corrupt = |reason: String| Error::CorruptSnapshot {
            path: path.to_path_buf(),
            reason,
        };
        let truncated = |e: std::io::Error| match e.kind() {
            ErrorKind::UnexpectedEof => corrupt("truncated".to_string()),
            _ => Error::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            },
        };
        let ref mut magic = [0u8; 8];
        reader.read_exact(magic).map_err(truncated)?;
        if magic != Self::MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }
        let version = reader.read_u16::<BE>().map_err(truncated)?;
        if version != Self::VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }
        let iteration = reader.read_u64::<BE>().map_err(truncated)?;
        let length = reader.read_u16::<BE>().map_err(truncated)? as usize;
        let mut scheme = vec![0u8; length];
        reader.read_exact(&mut scheme).map_err(truncated)?;
        let scheme = String::from_utf8(scheme).map_err(|e| corrupt(e.to_string()))?;
        let count = reader.read_u64::<BE>().map_err(truncated)?;
        if count.saturating_mul(8) > size {
            return Err(corrupt(format!("{} parameters exceed file size", count)));
        }
        let parameters = (0..count)
            .map(|_| reader.read_f64::<BE>())
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(truncated)?;
        if reader.read_u8().is_ok() {
            return Err(corrupt("trailing bytes".to_string()));
        }
        Ok((Metadata { iteration, scheme }, parameters))
    }

    /// Reconstruct a frozen snapshot.
    pub fn load<E, S>(path: &Path) -> Result<(Metadata, S)>
    where
        E: Environment,
        S: Frozen<E>,
    {
        let (metadata, parameters) = Self::read(path)?;
        let snapshot = S::restore(&parameters).map_err(|e| Error::CorruptSnapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok((metadata, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        Metadata {
            iteration: 40,
            scheme: "naive".to_string(),
        }
    }

    #[test]
    fn path_is_deterministic_in_iteration() {
        let root = Path::new("run/menagerie");
        assert_eq!(Codec::path(root, 40), Codec::path(root, 40));
        assert_ne!(Codec::path(root, 40), Codec::path(root, 400));
        assert!(Codec::path(root, 40).ends_with("00000040_iterations.snapshot"));
    }

    #[test]
    fn reads_back_what_was_saved() {
        let dir = tempfile::tempdir().unwrap();
        let ref path = Codec::path(dir.path(), 40);
        let parameters = vec![1.5, -0.25, f64::MAX, 0.0];
        Codec::save(path, &metadata(), &parameters).unwrap();
        let (meta, read) = Codec::read(path).unwrap();
        assert_eq!(meta, metadata());
        assert_eq!(read, parameters);
        assert!(!path.with_extension("snapshot.tmp").exists());
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let ref path = Codec::path(dir.path(), 0);
        Codec::save(path, &metadata(), &[1.0]).unwrap();
        match Codec::save(path, &metadata(), &[2.0]) {
            Err(Error::PathCollision(p)) => assert_eq!(&p, path),
            other => panic!("expected collision, got {:?}", other),
        }
        assert_eq!(Codec::read(path).unwrap().1, vec![1.0]);
        assert!(!path.with_extension("snapshot.tmp").exists());
    }

    #[test]
    fn refuses_to_replace_a_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let ref path = Codec::path(dir.path(), 5);
        std::fs::write(path, b"not a snapshot").unwrap();
        assert!(matches!(
            Codec::save(path, &metadata(), &[1.0]),
            Err(Error::PathCollision(_))
        ));
        assert_eq!(std::fs::read(path).unwrap(), b"not a snapshot");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn rejects_truncated_files() {
        let dir = tempfile::tempdir().unwrap();
        let ref path = Codec::path(dir.path(), 0);
        Codec::save(path, &metadata(), &[1.0, 2.0, 3.0]).unwrap();
        let bytes = std::fs::read(path).unwrap();
        std::fs::write(path, &bytes[..bytes.len() - 4]).unwrap();
        assert!(matches!(Codec::read(path), Err(Error::CorruptSnapshot { .. })));
    }

    #[test]
    fn rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let ref path = dir.path().join("foreign.snapshot");
        std::fs::write(path, b"definitely not a snapshot").unwrap();
        assert!(matches!(Codec::read(path), Err(Error::CorruptSnapshot { .. })));
    }
}
