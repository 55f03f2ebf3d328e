#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::io::Write;
use std::path::Path;

/// Builds small single-disk ZIP archives in memory.
///
/// With [`ZipBuilder::zip64`] every size and offset is saturated in the
/// fixed headers and carried by ZIP64 extra fields and end records instead.
#[derive(Default)]
pub struct ZipBuilder {
    body: Vec<u8>,
    central: Vec<u8>,
    entries: u16,
    zip64: bool,
}

const SATURATED: u32 = 0xFFFFFFFF;

impl ZipBuilder {
    pub fn zip64() -> Self {
        Self {
            zip64: true,
            ..Self::default()
        }
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, 0, data.to_vec(), 0)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let packed = encoder.finish().unwrap();
        self.entry(name, data, 8, packed, 0)
    }

    /// A stored entry flagged as encrypted; the bytes are left as given.
    pub fn encrypted(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, 0, data.to_vec(), 0x1)
    }

    pub fn directory(self, name: &str) -> Self {
        self.entry(name, b"", 0, Vec::new(), 0)
    }

    fn entry(mut self, name: &str, plain: &[u8], method: u16, packed: Vec<u8>, flags: u16) -> Self {
        let mut crc = Crc::new();
        crc.update(plain);
        let lfh_offset = self.body.len() as u64;
        // 2024-12-01 12:00
        let (time, date) = (12u16 << 11, ((2024u16 - 1980) << 9) | (12 << 5) | 1);

        let (packed_len, plain_len, offset) = if self.zip64 {
            (SATURATED, SATURATED, SATURATED)
        } else {
            (packed.len() as u32, plain.len() as u32, lfh_offset as u32)
        };

        let mut local_extra = Vec::new();
        let mut central_extra = Vec::new();
        if self.zip64 {
            local_extra.write_u16::<LittleEndian>(0x0001).unwrap();
            local_extra.write_u16::<LittleEndian>(16).unwrap();
            local_extra.write_u64::<LittleEndian>(plain.len() as u64).unwrap();
            local_extra.write_u64::<LittleEndian>(packed.len() as u64).unwrap();

            central_extra.write_u16::<LittleEndian>(0x0001).unwrap();
            central_extra.write_u16::<LittleEndian>(24).unwrap();
            central_extra.write_u64::<LittleEndian>(plain.len() as u64).unwrap();
            central_extra.write_u64::<LittleEndian>(packed.len() as u64).unwrap();
            central_extra.write_u64::<LittleEndian>(lfh_offset).unwrap();
        }

        let b = &mut self.body;
        b.extend_from_slice(b"PK\x03\x04");
        b.write_u16::<LittleEndian>(if self.zip64 { 45 } else { 20 }).unwrap();
        b.write_u16::<LittleEndian>(flags).unwrap();
        b.write_u16::<LittleEndian>(method).unwrap();
        b.write_u16::<LittleEndian>(time).unwrap();
        b.write_u16::<LittleEndian>(date).unwrap();
        b.write_u32::<LittleEndian>(crc.sum()).unwrap();
        b.write_u32::<LittleEndian>(packed_len).unwrap();
        b.write_u32::<LittleEndian>(plain_len).unwrap();
        b.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        b.write_u16::<LittleEndian>(local_extra.len() as u16).unwrap();
        b.extend_from_slice(name.as_bytes());
        b.extend_from_slice(&local_extra);
        b.extend_from_slice(&packed);

        let c = &mut self.central;
        c.extend_from_slice(b"PK\x01\x02");
        c.write_u16::<LittleEndian>(45).unwrap();
        c.write_u16::<LittleEndian>(if self.zip64 { 45 } else { 20 }).unwrap();
        c.write_u16::<LittleEndian>(flags).unwrap();
        c.write_u16::<LittleEndian>(method).unwrap();
        c.write_u16::<LittleEndian>(time).unwrap();
        c.write_u16::<LittleEndian>(date).unwrap();
        c.write_u32::<LittleEndian>(crc.sum()).unwrap();
        c.write_u32::<LittleEndian>(packed_len).unwrap();
        c.write_u32::<LittleEndian>(plain_len).unwrap();
        c.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        c.write_u16::<LittleEndian>(central_extra.len() as u16).unwrap();
        c.write_u16::<LittleEndian>(0).unwrap();
        c.write_u16::<LittleEndian>(0).unwrap();
        c.write_u16::<LittleEndian>(0).unwrap();
        c.write_u32::<LittleEndian>(0).unwrap();
        c.write_u32::<LittleEndian>(offset).unwrap();
        c.extend_from_slice(name.as_bytes());
        c.extend_from_slice(&central_extra);

        self.entries += 1;
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.body;
        let cd_offset = out.len() as u64;
        let cd_size = self.central.len() as u64;
        out.extend_from_slice(&self.central);

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.write_u64::<LittleEndian>(44).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(self.entries as u64).unwrap();
            out.write_u64::<LittleEndian>(self.entries as u64).unwrap();
            out.write_u64::<LittleEndian>(cd_size).unwrap();
            out.write_u64::<LittleEndian>(cd_offset).unwrap();

            out.extend_from_slice(b"PK\x06\x07");
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();
        }

        let (count, size, offset) = if self.zip64 {
            (0xFFFF, SATURATED, SATURATED)
        } else {
            (self.entries, cd_size as u32, cd_offset as u32)
        };
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.finish()).unwrap();
    }
}

/// `per_day` lines for each date in `days`, in order.
pub fn log_lines(days: &[&str], per_day: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for day in days {
        for n in 0..per_day {
            out.extend_from_slice(format!("{day} 08:{:02}:{:02} INFO worker-{n} handled request\n", n / 60 % 60, n % 60).as_bytes());
        }
    }
    out
}

/// Every line of `log` starting with `date`, newline-terminated.
pub fn expected_lines(log: &[u8], date: &str) -> String {
    String::from_utf8_lossy(log)
        .lines()
        .filter(|l| l.starts_with(date))
        .map(|l| format!("{l}\n"))
        .collect()
}
