//! ROM images.

use std::error::Error;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::opcodes::{get_opcode_enum, get_opcode_length, get_opcode_str};
use crate::core::types::{I8Addr, I8Byte};
use crate::errors::CResult;

/// Arcade image size (four 2 KiB segments).
const ARCADE_ROM_SIZE: usize = 0x2000;

const EMPTY_ROM_NAME: &str = "<EMPTY>";

/// Segment files of the split arcade set, with their load offsets.
const ARCADE_SEGMENTS: [(&str, usize); 4] = [
    ("invaders.h", 0x0000),
    ("invaders.g", 0x0800),
    ("invaders.f", 0x1000),
    ("invaders.e", 0x1800),
];

/// ROM image.
pub struct Rom {
    title: String,
    path: String,
    data: Vec<I8Byte>,
}

/// Missing ROM error.
#[derive(Debug)]
pub struct MissingRomError(pub String);

impl Error for MissingRomError {
    fn description(&self) -> &str {
        "missing ROM"
    }
}

impl fmt::Display for MissingRomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROM image is not found: {}", self.0)
    }
}

impl Rom {
    /// Get ROM name from path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path.
    ///
    /// # Returns
    ///
    /// * ROM name.
    ///
    pub fn get_rom_name(path: &Path) -> String {
        match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_uppercase().replace('_', " "),
            None => String::from(EMPTY_ROM_NAME),
        }
    }

    /// Load a ROM from a path.
    ///
    /// A file loads as a single raw image; a directory loads as the split
    /// arcade set (`invaders.h/g/f/e`).
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a binary or a ROM-set directory.
    ///
    /// # Returns
    ///
    /// * ROM result.
    ///
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> CResult<Rom> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::load_from_directory(path);
        }

        debug!("loading ROM image {:?}", path);
        let mut file = File::open(path)
            .map_err(|_| MissingRomError(path.to_string_lossy().into_owned()))?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        Ok(Rom {
            title: Self::get_rom_name(path),
            path: path.to_string_lossy().into_owned(),
            data: contents,
        })
    }

    /// Load the split arcade set from a directory.
    ///
    /// The four segments land at 0x0000, 0x0800, 0x1000 and 0x1800.
    ///
    /// # Arguments
    ///
    /// * `dir` - ROM-set directory.
    ///
    /// # Returns
    ///
    /// * ROM result.
    ///
    pub fn load_from_directory<P: AsRef<Path>>(dir: P) -> CResult<Rom> {
        let dir = dir.as_ref();
        let mut data = vec![0; ARCADE_ROM_SIZE];

        for (name, offset) in &ARCADE_SEGMENTS {
            let path = Self::find_segment(dir, name)
                .ok_or_else(|| MissingRomError(format!("{}/{}", dir.display(), name)))?;

            debug!("loading ROM segment {:?} at {:04X}", path, offset);
            let mut file = File::open(&path)?;
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;

            data[*offset..*offset + contents.len()].copy_from_slice(&contents);
        }

        Ok(Rom {
            title: Self::get_rom_name(dir),
            path: dir.to_string_lossy().into_owned(),
            data,
        })
    }

    /// Find a segment file in a ROM-set directory, case-insensitively.
    fn find_segment(dir: &Path, name: &str) -> Option<PathBuf> {
        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let file_name = entry.file_name().to_string_lossy().to_lowercase();
            if file_name == name {
                return Some(entry.path().to_path_buf());
            }
        }

        None
    }

    /// Load a ROM from bytes.
    ///
    /// # Arguments
    ///
    /// * `title` - ROM title.
    /// * `bytes` - Image bytes.
    ///
    /// # Returns
    ///
    /// * ROM instance.
    ///
    pub fn from_bytes(title: &str, bytes: &[I8Byte]) -> Rom {
        Rom {
            title: title.to_string(),
            path: String::new(),
            data: bytes.to_vec(),
        }
    }

    /// Get ROM title.
    ///
    /// # Returns
    ///
    /// * Title.
    ///
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Get ROM path.
    ///
    /// # Returns
    ///
    /// * Path.
    ///
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Get internal data.
    ///
    /// # Returns
    ///
    /// * Data.
    ///
    pub fn get_data(&self) -> &[I8Byte] {
        &self.data
    }

    /// Disassemble the image.
    ///
    /// Returns one entry per instruction: (address, assembly, verbose).
    ///
    /// # Returns
    ///
    /// * Disassembly listing.
    ///
    pub fn disassemble(&self) -> Vec<(I8Addr, String, String)> {
        let mut output = Vec::with_capacity(self.data.len());
        let mut ptr = 0usize;

        while ptr < self.data.len() {
            let byte_at = |offset: usize| -> I8Byte {
                self.data.get(ptr + offset).copied().unwrap_or(0)
            };

            let opcode = get_opcode_enum(byte_at(0), byte_at(1), byte_at(2));
            let (assembly, verbose) = get_opcode_str(&opcode);
            output.push((ptr as I8Addr, assembly, verbose));

            ptr += get_opcode_length(&opcode) as usize;
        }

        output
    }

    /// Write disassembly to a file, or to the console for `-`.
    ///
    /// # Arguments
    ///
    /// * `output_file` - Output path.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn write_disassembly_to_file(&self, output_file: &str) -> CResult {
        if output_file == "-" {
            println!("> Disassembly:");
            self.write_disassembly_to_stream(&mut io::stdout())
        } else {
            println!("> Disassembly dumped to file {}.", output_file);
            let mut file_handle = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(output_file)?;

            self.write_disassembly_to_stream(&mut file_handle)
        }
    }

    /// Write disassembly to a stream.
    ///
    /// # Arguments
    ///
    /// * `output_stream` - Output stream.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn write_disassembly_to_stream<W: Write>(&self, output_stream: &mut W) -> CResult {
        for (addr, assembly, verbose) in self.disassemble() {
            writeln!(output_stream, "{:04X}| {:20} ; {}", addr, assembly, verbose)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let rom = Rom::from_bytes("Test", &[0x00, 0x3E, 0xFF, 0x76]);
        assert_eq!(rom.get_title(), "Test");
        assert_eq!(rom.get_data().len(), 4);
    }

    #[test]
    fn test_rom_name() {
        assert_eq!(Rom::get_rom_name(Path::new("invaders.rom")), "INVADERS");
        assert_eq!(
            Rom::get_rom_name(Path::new("roms/space_invaders.bin")),
            "SPACE INVADERS"
        );
        assert_eq!(Rom::get_rom_name(Path::new("")), EMPTY_ROM_NAME);
    }

    #[test]
    fn test_disassembly_walks_lengths() {
        // NOP; MVI A, 0xFF; JMP 0x0000; HLT
        let rom = Rom::from_bytes("Test", &[0x00, 0x3E, 0xFF, 0xC3, 0x00, 0x00, 0x76]);
        let listing = rom.disassemble();

        assert_eq!(listing.len(), 4);
        assert_eq!(listing[0], (0x0000, "NOP".to_string(), "No operation".to_string()));
        assert_eq!(listing[1].0, 0x0001);
        assert_eq!(listing[1].1, "MVI A, FF");
        assert_eq!(listing[2].1, "JMP 0000");
        assert_eq!(listing[3].0, 0x0006);
        assert_eq!(listing[3].1, "HLT");
    }

    #[test]
    fn test_disassembly_stream_format() {
        let rom = Rom::from_bytes("Test", &[0x3E, 0x01]);
        let mut raw = Vec::new();
        rom.write_disassembly_to_stream(&mut raw).unwrap();

        let text = std::str::from_utf8(&raw).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "0000| MVI A, 01            ; Set A = 01"
        );
    }
}
