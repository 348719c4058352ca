use std::{
    fs::File,
    io::{self, Read},
};

const PROC_SELF_STATUS_PATH: &str = "/proc/self/status";
const PROC_MEMINFO_PATH: &str = "/proc/meminfo";

const VM_RSS_LABEL: &[u8] = b"VmRSS:";
const VM_SIZE_LABEL: &[u8] = b"VmSize:";
const MEM_TOTAL_LABEL: &[u8] = b"MemTotal:";
const MEM_FREE_LABEL: &[u8] = b"MemFree:";
const CACHED_LABEL: &[u8] = b"Cached:";

const SCAN_BUF_SIZE: usize = 8192;

/// A process memory usage querier.
pub struct ProcessQuerier {
    scanner: Scanner<File>,
}

impl ProcessQuerier {
    /// Gets the resident memory of this process, in bytes.
    ///
    /// This is the `VmRSS` field of `/proc/self/status`: the pages of the process currently backed by physical
    /// memory. If the value cannot be determined, `None` is returned, which should generally be considered an
    /// incredibly rare/unlikely event.
    pub fn resident_memory(&mut self) -> Option<u64> {
        self.scanner.reset_with_path(PROC_SELF_STATUS_PATH).ok()?;
        scan_labeled_sum(&mut self.scanner, &[VM_RSS_LABEL])
    }

    /// Gets the virtual memory of this process, in bytes.
    ///
    /// This is the `VmSize` field of `/proc/self/status`: the total address space the process has reserved, whether
    /// or not it is backed by physical pages. If the value cannot be determined, `None` is returned.
    pub fn virtual_memory(&mut self) -> Option<u64> {
        self.scanner.reset_with_path(PROC_SELF_STATUS_PATH).ok()?;
        scan_labeled_sum(&mut self.scanner, &[VM_SIZE_LABEL])
    }
}

impl Default for ProcessQuerier {
    fn default() -> Self {
        Self { scanner: Scanner::new() }
    }
}

/// A system memory usage querier.
pub struct SystemQuerier {
    scanner: Scanner<File>,
}

impl SystemQuerier {
    /// Gets the free physical memory of the system, in bytes.
    ///
    /// This is the sum of the `MemFree` and `Cached` fields of `/proc/meminfo`, since the page cache is reclaimed
    /// when the system comes under memory pressure. If either field cannot be determined, `None` is returned.
    pub fn free_memory(&mut self) -> Option<u64> {
        self.scanner.reset_with_path(PROC_MEMINFO_PATH).ok()?;
        scan_labeled_sum(&mut self.scanner, &[MEM_FREE_LABEL, CACHED_LABEL])
    }

    /// Gets the total physical memory of the system, in bytes.
    ///
    /// This is the `MemTotal` field of `/proc/meminfo`. If the value cannot be determined, `None` is returned.
    pub fn total_memory(&mut self) -> Option<u64> {
        self.scanner.reset_with_path(PROC_MEMINFO_PATH).ok()?;
        scan_labeled_sum(&mut self.scanner, &[MEM_TOTAL_LABEL])
    }
}

impl Default for SystemQuerier {
    fn default() -> Self {
        Self { scanner: Scanner::new() }
    }
}

/// Scans every line the scanner yields for the given labels, summing their values.
///
/// A label matches when it is a literal prefix of a line, and contributes the first run of ASCII digits following
/// it, interpreted as a kilobyte count. Only the first occurrence of each label is taken, and the scan stops as soon
/// as every label has matched. The sum is returned in bytes.
///
/// If any label never matches, or a matched label is not followed by a digit run, `None` is returned: partially
/// available values would silently under-report, so they are treated as wholly unavailable.
fn scan_labeled_sum<T>(scanner: &mut Scanner<T>, labels: &[&[u8]]) -> Option<u64>
where
    T: Read,
{
    debug_assert!(labels.len() < u32::BITS as usize);

    let all_matched = (1u32 << labels.len()) - 1;
    let mut matched = 0u32;
    let mut total_bytes = 0u64;

    while let Ok(Some(line)) = scanner.next_line() {
        for (idx, label) in labels.iter().enumerate() {
            if matched & (1 << idx) != 0 || !line.starts_with(label) {
                continue;
            }

            let kb_value = extract_kb_value(&line[label.len()..])?;
            total_bytes += kb_value * 1024;
            matched |= 1 << idx;
        }

        // Stop reading as soon as every label has been seen.
        if matched == all_matched {
            return Some(total_bytes);
        }
    }

    None
}

/// Extracts the first run of ASCII digits in `raw` as a decimal kilobyte count.
fn extract_kb_value(raw: &[u8]) -> Option<u64> {
    let start = raw.iter().position(|b| b.is_ascii_digit())?;
    let digits = &raw[start..];
    let end = digits.iter().position(|b| !b.is_ascii_digit()).unwrap_or(digits.len());

    // The digit run is ASCII by construction, so the UTF-8 validation cannot fail.
    std::str::from_utf8(&digits[..end]).ok()?.parse::<u64>().ok()
}

/// A buffered line scanner.
///
/// The buffer is allocated once and reused across scans, so a querier that holds on to its scanner performs no
/// allocations after construction, no matter how often it is asked to re-read a file.
struct Scanner<T> {
    io: Option<T>,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    eof: bool,
    resync: bool,
}

impl<T> Scanner<T>
where
    T: Read,
{
    fn new() -> Self {
        Self {
            io: None,
            buf: vec![0; SCAN_BUF_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            eof: false,
            resync: false,
        }
    }

    fn reset(&mut self, io: T) {
        self.io = Some(io);
        self.pos = 0;
        self.filled = 0;
        self.eof = false;
        self.resync = false;
    }

    fn fill_buf(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }

        // Shift the unconsumed tail to the front to make room for more data.
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }

        let io = self
            .io
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no file set in scanner"))?;

        while self.filled < self.buf.len() {
            let n = io.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                self.eof = true;
                break;
            }

            self.filled += n;
        }

        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            // Hand back the next full line in the buffer, if there is one.
            if let Some(newline_idx) = self.buf[self.pos..self.filled].iter().position(|&b| b == b'\n') {
                let start = self.pos;
                self.pos += newline_idx + 1;

                if self.resync {
                    // This newline ends the tail of an oversized line, not a real line.
                    self.resync = false;
                    continue;
                }

                return Ok(Some(&self.buf[start..start + newline_idx]));
            }

            if self.eof {
                let start = self.pos;
                self.pos = self.filled;

                if !self.resync && start < self.filled {
                    // Final line without a trailing newline.
                    return Ok(Some(&self.buf[start..self.filled]));
                }

                return Ok(None);
            }

            if self.pos == 0 && self.filled == self.buf.len() {
                // A single line larger than the entire buffer. No file we scan has lines anywhere near that long,
                // but don't spin on one: drop the buffered bytes and resynchronize at the next newline.
                self.filled = 0;
                self.resync = true;
            }

            self.fill_buf()?;
        }
    }
}

impl Scanner<File> {
    fn reset_with_path(&mut self, path: &str) -> io::Result<()> {
        let file = File::open(path)?;
        self.reset(file);

        Ok(())
    }
}


#[cfg(all(test, target_os = "linux"))]
mod linux_tests {
    use super::{ProcessQuerier, SystemQuerier};

    #[test]
    fn process_queries() {
        let mut querier = ProcessQuerier::default();
        assert!(querier.resident_memory().is_some_and(|bytes| bytes > 0));
        assert!(querier.virtual_memory().is_some_and(|bytes| bytes > 0));
    }

    #[test]
    fn repeated_queries_stay_plausible() {
        let mut querier = ProcessQuerier::default();
        for _ in 0..8 {
            assert!(querier.resident_memory().is_some_and(|bytes| bytes > 0));
        }
    }

    #[test]
    fn system_total_at_least_free() {
        let mut querier = SystemQuerier::default();
        let total = querier.total_memory().expect("total memory should be available");
        let free = querier.free_memory().expect("free memory should be available");
        assert!(total >= free);
    }
}
