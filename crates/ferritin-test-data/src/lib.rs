//! ferritin-test-data
//!
//! Test fixtures for the NA-MPNN wrapper, embedded in the crate so tests do not depend
//! on the working directory.
//!
//! - `TestFile`: structure files, materialised as temporary files.
//! - `FakeTool`: a shell script standing in for `inference/run.py`.
//! - `SpecificityFixture`: writes a `.npz` archive laid out the way the inference tool writes it.
use ndarray::{array, Array1, Array2};
use ndarray_npy::WriteNpyExt;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use ferritin_test_data::TestFile;
/// let (pdb_file, _temp) = TestFile::dna_complex_01().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// Three protein residues on chain A, three DNA residues on chain B.
    pub fn dna_complex_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/structures/dna_complex.pdb"),
            suffix: "pdb",
        }
    }

    pub fn create_temp(&self) -> io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.filebinary
    }

    /// Write the file into `dir` under `name`. Used to populate batch input folders.
    pub fn write_to(&self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, self.filebinary)?;
        Ok(path)
    }
}

/// FASTA in the shape the design tool writes: a native record followed by the samples.
pub const DESIGN_FASTA: &str = "\
>dna_complex, T=0.1, seed=42, num_res=6, num_ligand_res=0, use_ligand_context=False
ARKacg
>dna_complex, id=1, T=0.1, seed=42, overall_confidence=0.4521, seq_rec=0.6667
AKKacg
>dna_complex, id=2, T=0.1, seed=42, overall_confidence=0.4310, seq_rec=0.5000
GRKtcg
";

/// A fake inference tool.
///
/// The script records its argv (one argument per line), picks `--out_folder` out of
/// the arguments and then runs `body` with `$out` and `$pdb` set. Run it as `sh <script> ...`.
#[derive(Debug)]
pub struct FakeTool {
    dir: TempDir,
    script: PathBuf,
    argv_log: PathBuf,
}

impl FakeTool {
    pub fn new(body: &str) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("run.sh");
        let argv_log = dir.path().join("argv.txt");
        let text = format!(
            r#"#!/bin/sh
printf '%s\n' "$@" > '{argv}'
out=""
pdb=""
while [ $# -gt 0 ]; do
  case "$1" in
    --out_folder) out="$2"; shift 2 ;;
    --pdb_path) pdb="$2"; shift 2 ;;
    *) shift ;;
  esac
done
{body}
"#,
            argv = argv_log.display(),
        );
        fs::write(&script, text)?;
        Ok(Self {
            dir,
            script,
            argv_log,
        })
    }

    /// Writes each `(file name, contents)` pair under `$out/seqs`.
    pub fn writes_sequences(files: &[(&str, &str)]) -> io::Result<Self> {
        Self::new(&sequences_body(files))
    }

    /// Like [`FakeTool::writes_sequences`], but first copies the structure it was given
    /// to `keep`, so tests can see what reached the tool.
    pub fn keeps_structure(keep: &Path, files: &[(&str, &str)]) -> io::Result<Self> {
        Self::new(&format!(
            "cp \"$pdb\" '{}'\n{}",
            keep.display(),
            sequences_body(files)
        ))
    }

    /// Copies `archive` to `$out/specificity/<name>`.
    pub fn writes_archive(archive: &Path, name: &str) -> io::Result<Self> {
        Self::new(&format!(
            "mkdir -p \"$out/specificity\"\ncp '{}' \"$out/specificity/{name}\"\n",
            archive.display()
        ))
    }

    /// Creates `$out/<subdir>` and leaves it empty.
    pub fn writes_empty_dir(subdir: &str) -> io::Result<Self> {
        Self::new(&format!("mkdir -p \"$out/{subdir}\"\n"))
    }

    /// Exits successfully without writing anything.
    pub fn writes_nothing() -> io::Result<Self> {
        Self::new("exit 0\n")
    }

    pub fn fails(stderr: &str, code: i32) -> io::Result<Self> {
        Self::new(&format!("echo '{stderr}' >&2\nexit {code}\n"))
    }

    /// `exec` so the shell itself is the sleeping process and receives the kill.
    pub fn sleeps(seconds: u64) -> io::Result<Self> {
        Self::new(&format!("exec sleep {seconds}\n"))
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Arguments of the last invocation, without the script path.
    pub fn recorded_args(&self) -> io::Result<Vec<String>> {
        let text = fs::read_to_string(&self.argv_log)?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}

fn sequences_body(files: &[(&str, &str)]) -> String {
    let mut body = String::from("mkdir -p \"$out/seqs\"\n");
    for (name, contents) in files {
        // the heredoc terminator has to start its own line
        let newline = if contents.ends_with('\n') { "" } else { "\n" };
        body.push_str(&format!(
            "cat > \"$out/seqs/{name}\" <<'FASTA_END'\n{contents}{newline}FASTA_END\n"
        ));
    }
    body
}

/// Arrays of a specificity archive.
#[derive(Debug, Clone)]
pub struct SpecificityFixture {
    pub predicted_ppm: Array2<f32>,
    pub dna_mask: Array1<bool>,
    pub restype_to_int: BTreeMap<String, i64>,
}

impl SpecificityFixture {
    /// Five positions, three of them DNA, with the DNA columns deliberately out of
    /// alphabetical order: DT=1, DC=3, DA=4, DG=5.
    ///
    /// Expected PPM (DA, DC, DG, DT):
    /// 1. 0.70 0.10 0.10 0.10
    /// 2. 0.05 0.05 0.85 0.05
    /// 3. 0.25 0.25 0.25 0.25
    pub fn example_01() -> Self {
        let restype_to_int = [
            ("ALA", 0),
            ("DT", 1),
            ("GLY", 2),
            ("DC", 3),
            ("DA", 4),
            ("DG", 5),
            ("UNK", 6),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        #[rustfmt::skip]
        let predicted_ppm = array![
            [0.90, 0.00, 0.10, 0.00, 0.00, 0.00, 0.00],
            [0.00, 0.10, 0.00, 0.10, 0.70, 0.10, 0.00],
            [0.00, 0.05, 0.00, 0.05, 0.05, 0.85, 0.00],
            [0.20, 0.00, 0.80, 0.00, 0.00, 0.00, 0.00],
            [0.00, 0.25, 0.00, 0.25, 0.25, 0.25, 0.00],
        ];

        Self {
            predicted_ppm,
            dna_mask: array![false, true, true, false, true],
            restype_to_int,
        }
    }

    /// Same symbols, no DNA positions.
    pub fn protein_only() -> Self {
        let mut fixture = Self::example_01();
        fixture.dna_mask.fill(false);
        fixture
    }

    /// Write an `np.savez`-style archive (stored, uncompressed members).
    pub fn write_npz(&self, path: &Path) -> io::Result<()> {
        let mut ppm = Vec::new();
        self.predicted_ppm
            .write_npy(&mut ppm)
            .map_err(io::Error::other)?;
        let mut mask = Vec::new();
        self.dna_mask.write_npy(&mut mask).map_err(io::Error::other)?;
        let pickled = serde_pickle::to_vec(&self.restype_to_int, serde_pickle::SerOptions::new())
            .map_err(io::Error::other)?;

        let file = fs::File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, bytes) in [
            ("predicted_ppm.npy", ppm),
            ("dna_mask.npy", mask),
            ("restype_to_int.npy", object_npy(&numpy_object_pickle(&pickled))),
        ] {
            zip.start_file(name, options).map_err(io::Error::other)?;
            zip.write_all(&bytes)?;
        }
        zip.finish().map_err(io::Error::other)?;
        Ok(())
    }
}

/// Wrap a pickled value the way `np.save` pickles a 0-d object array holding it:
/// `_reconstruct(ndarray, (0,), b'b')`, then `BUILD` with the array state
/// `(1, (), dtype('O'), False, [value])`.
fn numpy_object_pickle(value: &[u8]) -> Vec<u8> {
    // drop the PROTO header and the STOP of the inner pickle
    let inner = &value[2..value.len() - 1];

    let mut out = b"\x80\x03".to_vec();
    out.extend_from_slice(b"cnumpy.core.multiarray\n_reconstruct\n");
    out.extend_from_slice(b"cnumpy\nndarray\n");
    out.extend_from_slice(b"K\x00\x85C\x01b\x87R");
    // state: (1, (), dtype, False, [value])
    out.extend_from_slice(b"(K\x01)");
    out.extend_from_slice(b"cnumpy\ndtype\nX\x02\x00\x00\x00O8\x89\x88\x87R");
    out.extend_from_slice(
        b"(K\x03X\x01\x00\x00\x00|NNNJ\xff\xff\xff\xffJ\xff\xff\xff\xffK?tb",
    );
    out.extend_from_slice(b"\x89]");
    out.extend_from_slice(inner);
    out.extend_from_slice(b"atb.");
    out
}

/// A 0-d object array: npy v1.0 header followed by the pickle.
fn object_npy(pickle: &[u8]) -> Vec<u8> {
    let dict = "{'descr': '|O', 'fortran_order': False, 'shape': (), }";
    // magic + version + length prefix + header + newline must be a multiple of 64
    let unpadded = 10 + dict.len() + 1;
    let pad = (64 - unpadded % 64) % 64;
    let header = format!("{dict}{}\n", " ".repeat(pad));

    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(pickle);
    out
}
