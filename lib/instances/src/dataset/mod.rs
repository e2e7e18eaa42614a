use std::borrow::Cow;
use std::path::{Path, PathBuf};
use anyhow::Context;
use tracing::*;

use crate::{Map, Result, CanonicalInstance};
use crate::dialect::{ConvertOptions, Dialect};


pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }

  fn check_idx(&self, idx: usize) -> Result<()> {
    if self.len() <= idx {
      anyhow::bail!("instance index {} out of range (0..{})", idx, self.len())
    } else {
      Ok(())
    }
  }
}


pub trait Dataset: IdxNameMap + Sync {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;
}


/// Lower-cased base name of an input: the file stem for files, the directory name for folders.
pub fn instance_name(path: &Path) -> Result<String> {
  let name = if path.is_dir() { path.file_name() } else { path.file_stem() };
  let name = name.ok_or_else(|| anyhow::anyhow!("cannot derive an instance name from {:?}", path))?;
  Ok(name.to_string_lossy().to_lowercase())
}

fn is_pattern(s: &str) -> bool {
  s.contains(|c: char| matches!(c, '*' | '?' | '['))
}


#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub path: PathBuf,
  pub dialect: Dialect,
  pub name: String,
  /// Why this input cannot be converted; loading it fails with this message.
  pub rejected: Option<String>,
}

/// The inputs of one conversion batch, indexed in the order given.
#[derive(Debug, Clone)]
pub struct InstanceSet {
  entries: Vec<Entry>,
  name_to_idx: Map<String, usize>,
  options: ConvertOptions,
}

impl InstanceSet {
  pub fn new(options: ConvertOptions) -> Self {
    InstanceSet { entries: Vec::new(), name_to_idx: Map::default(), options }
  }

  /// Inputs may be glob patterns; matches are added in path order. Without an explicit dialect
  /// each input's dialect is detected from whether it is a directory.
  pub fn from_inputs<S: AsRef<str>>(inputs: &[S], dialect: Option<Dialect>, options: ConvertOptions) -> Result<Self> {
    let mut set = InstanceSet::new(options);
    for input in inputs {
      let input = input.as_ref();
      if is_pattern(input) {
        let paths: std::result::Result<Vec<PathBuf>, _> = glob::glob(input)
          .with_context(|| format!("invalid pattern {:?}", input))?
          .collect();
        let paths = paths?;
        if paths.is_empty() {
          warn!(pattern=input, "pattern matched nothing");
        }
        for p in paths {
          set.push(p, dialect)?;
        }
      } else {
        set.push(input, dialect)?;
      }
    }
    Ok(set)
  }

  /// Inputs without a usable name, or whose name is already taken, are kept as rejected entries
  /// so the batch can report them; only the first input with a given name is reachable by name.
  pub fn push(&mut self, path: impl Into<PathBuf>, dialect: Option<Dialect>) -> Result<usize> {
    let path = path.into();
    let dialect = dialect.unwrap_or_else(|| Dialect::detect(&path));
    let idx = self.entries.len();
    let (name, rejected) = match instance_name(&path) {
      Ok(name) => match self.name_to_idx.get(&name).copied() {
        Some(other) => {
          let reason = format!("{:?} and {:?} both map to instance name {:?}", self.entries[other].path, path, name);
          (name, Some(reason))
        }
        None => {
          self.name_to_idx.insert(name.clone(), idx);
          (name, None)
        }
      },
      Err(e) => (path.to_string_lossy().into_owned(), Some(format!("{:#}", e))),
    };
    match &rejected {
      Some(reason) => warn!(idx, ?path, %reason, "input rejected"),
      None => trace!(idx, %name, %dialect, ?path, "add input"),
    }
    self.entries.push(Entry { path, dialect, name, rejected });
    Ok(idx)
  }

  pub fn rejected(&self) -> impl Iterator<Item=&Entry> {
    self.entries.iter().filter(|e| e.rejected.is_some())
  }

  pub fn entry(&self, idx: usize) -> Result<&Entry> {
    self.check_idx(idx)?;
    Ok(&self.entries[idx])
  }

  pub fn entries(&self) -> &[Entry] { &self.entries }

  pub fn options(&self) -> &ConvertOptions { &self.options }

  /// `<prefix><name>.csv`
  pub fn output_file_name(&self, idx: usize, prefix: &str) -> Result<String> {
    Ok(format!("{}{}.csv", prefix, self.entry(idx)?.name))
  }
}

impl IdxNameMap for InstanceSet {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    Ok(Cow::Borrowed(&self.entry(idx)?.name))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.name_to_idx.get(name).copied()
      .ok_or_else(|| anyhow::anyhow!("unknown instance name {:?}", name))
  }

  fn len(&self) -> usize { self.entries.len() }
}

impl Dataset for InstanceSet {
  type Instance = CanonicalInstance;

  fn load_instance(&self, idx: usize) -> Result<CanonicalInstance> {
    let Entry { path, dialect, name, rejected } = self.entry(idx)?;
    if let Some(reason) = rejected {
      anyhow::bail!("{}", reason);
    }
    dialect.load(path, Cow::Borrowed(name.as_str()), &self.options)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use crate::dialect::{BenchmarkDialect, FolderDialect};

  const BENCHMARK: &str = "R9\n\nVEHICLE\nNUMBER CAPACITY\n4 50\n\nCUSTOMER\nHEADER\n\n0 0 0 0 0 100 0\n1 3 4 10 0 100 5\n";

  #[test]
  fn names_and_dialects() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let folder = dir.path().join("Depot_North");
    fs::create_dir(&folder)?;
    let file = dir.path().join("R9.txt");
    fs::write(&file, BENCHMARK)?;

    let mut set = InstanceSet::new(ConvertOptions::default());
    set.push(&folder, None)?;
    set.push(&file, None)?;
    assert_eq!(set.len(), 2);
    assert_eq!(set.index_to_name(0)?, "depot_north");
    assert_eq!(set.index_to_name(1)?, "r9");
    assert_eq!(set.name_to_index("r9")?, 1);
    assert!(set.name_to_index("R9").is_err());
    assert_eq!(set.entry(0)?.dialect, Dialect::Folder(FolderDialect::V2_SCALED));
    assert_eq!(set.entry(1)?.dialect, Dialect::Benchmark(BenchmarkDialect::Tiered));
    assert_eq!(set.output_file_name(1, "m")?, "mr9.csv");
    assert!(set.entry(2).is_err());
    Ok(())
  }

  #[test]
  fn duplicate_names() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.txt"), BENCHMARK)?;
    fs::write(dir.path().join("A.dat"), BENCHMARK)?;
    let mut set = InstanceSet::new(ConvertOptions::default());
    set.push(dir.path().join("a.txt"), None)?;
    assert_eq!(set.push(dir.path().join("A.dat"), None)?, 1);
    assert_eq!(set.len(), 2);
    assert_eq!(set.name_to_index("a")?, 0);
    assert!(set.entry(0)?.rejected.is_none());
    assert!(set.entry(1)?.rejected.is_some());
    assert!(set.load_instance(0).is_ok());
    let err = set.load_instance(1).unwrap_err();
    assert!(err.to_string().contains("both map to instance name"));
    Ok(())
  }

  #[test]
  fn unnamed_input_does_not_stop_the_rest() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("R9.txt");
    fs::write(&file, BENCHMARK)?;
    let parent = dir.path().join("..");
    let inputs = [parent.to_string_lossy(), file.to_string_lossy()];
    let set = InstanceSet::from_inputs(&inputs, None, ConvertOptions::default())?;
    assert_eq!(set.len(), 2);
    assert_eq!(set.rejected().count(), 1);
    assert!(set.load_instance(0).unwrap_err().to_string().contains("cannot derive an instance name"));
    assert_eq!(set.load_instance(1)?.id, "r9");
    Ok(())
  }

  #[test]
  fn glob_inputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    for n in &["c2.txt", "c1.txt", "notes.md"] {
      fs::write(dir.path().join(n), BENCHMARK)?;
    }
    let pattern = format!("{}/*.txt", dir.path().display());
    let set = InstanceSet::from_inputs(&[pattern], Some(Dialect::Benchmark(BenchmarkDialect::Homogeneous)), ConvertOptions::default())?;
    let names: Vec<_> = set.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["c1", "c2"]);
    Ok(())
  }

  #[test]
  fn load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("R9.txt");
    fs::write(&file, BENCHMARK)?;
    let set = InstanceSet::from_inputs(&[file.to_string_lossy()], None, ConvertOptions::new(3)?)?;
    let inst = set.load_instance(0)?;
    assert_eq!(inst.id, "r9");
    assert_eq!(inst.n_customers(), 2);
    assert_eq!(inst.max_splits, Some(3));
    Ok(())
  }
}
